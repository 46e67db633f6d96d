use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E0xxx: collection errors
/// - E1xxx: validation errors and warnings
/// - E2xxx: obfuscation errors
/// - E9xxx: internal invariant violations
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Collection (E0xxx)
    /// Reserved word declared (non-entry-point)
    E0001,
    /// Malformed region marker comment
    E0002,

    // Validation (E1xxx)
    /// Undeclared identifier
    E1001,
    /// Import used but not exported by its provider
    E1002,
    /// Unused export
    E1003,
    /// Unused import (warning)
    E1004,
    /// Unsupported extension
    E1005,
    /// Wildcard extension with require/enable behavior
    E1006,
    /// Dead function (warning)
    E1007,
    /// Dead variable (warning)
    E1008,

    // Obfuscation (E2xxx)
    /// Qualifier collision across preprocessor branches
    E2001,

    // Internal (E9xxx)
    /// Stale node index or missing uid back-reference
    E9001,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
