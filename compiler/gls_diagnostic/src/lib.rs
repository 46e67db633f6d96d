//! Diagnostic system for the glsc shader compiler.
//!
//! - Error codes for searchability (`ErrorCode`)
//! - Severity levels and file attribution (`Diagnostic`)
//! - Build-scoped accumulation (`DiagnosticQueue`)
//!
//! Hard failures abort a build after the queue is drained; soft diagnostics
//! (dead code, unused imports) are reported once the full multi-file build
//! completes.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{
    reserved_declaration, undeclared_identifier, unresolved_import, Diagnostic, Severity,
};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;
