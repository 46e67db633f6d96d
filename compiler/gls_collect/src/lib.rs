//! Main-sequence collection for the glsc shader compiler.
//!
//! A single depth-first walk turns the syntax tree into the flat, ordered
//! `MainSequence` that every later pass traverses. This crate also owns the
//! symbol-resolution primitives built on that sequence.

mod collector;
mod event;
mod resolve;

pub use collector::collect;
pub use event::{
    DeclKind, DeclRecord, MainSequence, ScopeId, ScopeKind, SequenceEvent, UsageKind, UsageRecord,
};
pub use resolve::{find_struct, receiver_type, resolve, resolve_field, FieldResolution};

use gls_ast::NodeKind;

/// Failures during collection. All are hard errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    #[error("cannot declare reserved identifier `{name}`")]
    ReservedDeclaration { name: String },

    #[error(transparent)]
    Marker(#[from] gls_ast::MalformedMarker),

    #[error("stale node index: tree was mutated without recomputation")]
    StaleIndex,

    #[error("{kind:?} node has no uid assigned")]
    MissingUid { kind: NodeKind },
}
