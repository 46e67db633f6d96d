//! glsc syntax tree and supporting structures.
//!
//! This crate contains the data layer shared by every compiler pass:
//! - `SyntaxTree`/`SyntaxNode`: the arena-backed tree for one shader file
//! - `walker`: generic pre/post-order traversal
//! - `NodeIndex`: uid lookup, ancestor queries, recomputation after edits
//! - `marker`: the annotation-comment grammar for region boundaries
//! - `UnitMetadata`: offset-indexed side tables from the external parser
//! - `reserved`: the static reserved-identifier tables
//!
//! # Mutation contract
//!
//! Uids are dense post-order numbers, valid for one epoch. Any structural
//! edit bumps the tree epoch; `NodeIndex::recompute` must run before the
//! next uid-dependent pass. `NodeIndex::is_current` checks compliance.

pub mod build;
mod index;
pub mod marker;
mod metadata;
mod node;
pub mod reserved;
mod tree;
pub mod walker;

pub use index::NodeIndex;
pub use marker::{ExtensionBehavior, MalformedMarker, Marker};
pub use metadata::{ContractSpec, ExtensionUse, GraphNodeMeta, UnitMetadata};
pub use node::{NodeId, NodeKind, Qualifier, SyntaxNode, Uid};
pub use tree::SyntaxTree;
pub use walker::{walk, walk_with, Visitor};
