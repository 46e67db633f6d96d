//! Optimization passes for the glsc shader compiler.
//!
//! Two passes, both driven by the collected main sequence: brace elision
//! marks single-statement blocks for compact emission, and slot reuse folds
//! function-local temporaries with disjoint live ranges onto shared hoisted
//! slots. Slot reuse edits the tree structurally, so the driver must
//! recompute the node index and re-collect the sequence before any later
//! uid-dependent pass.

use thiserror::Error;

mod braces;
mod slots;

pub use braces::mark_eliminable_braces;
pub use slots::reuse_slots;

/// Optimizer failure modes.
#[derive(Error, Debug)]
pub enum OptError {
    /// The node index does not match the tree's current epoch.
    #[error("node index is stale, recompute before optimizing")]
    StaleIndex,
}
