//! Source regeneration for the glsc shader compiler.
//!
//! The translator renders the transformed tree back to GLSL text: a
//! recursive descent mirrors the grammar productions while offset-indexed
//! side tables (directives, extension lines) are merged back in offset
//! order, then a final textual pass applies the `@remove`/`@protect`
//! markers and expands graph-node metadata.

use tracing::debug;

use gls_ast::{SyntaxTree, UnitMetadata};

mod emitter;
mod expr;
mod text;

pub use emitter::declaration_text;
pub use expr::expr;
pub use text::apply_text_markers;

/// Regenerate the unit's source text.
pub fn translate(tree: &SyntaxTree, metadata: &UnitMetadata) -> String {
    let body = emitter::Emitter::new(tree, metadata).run();
    let out = text::apply_text_markers(&body, metadata);
    debug!(bytes = out.len(), "translated unit");
    out
}
