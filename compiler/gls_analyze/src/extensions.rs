//! Extension directive checking.

use gls_ast::{reserved, ExtensionBehavior, UnitMetadata};
use gls_collect::{MainSequence, SequenceEvent};
use gls_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};

/// Validate every extension directive in the sequence and the side table.
pub fn check_extensions(
    file: &str,
    seq: &MainSequence,
    metadata: &UnitMetadata,
    queue: &mut DiagnosticQueue,
) {
    let from_sequence = seq.iter().filter_map(|event| match event {
        SequenceEvent::Extension { name, behavior } => Some((name.as_str(), *behavior)),
        _ => None,
    });
    let from_metadata = metadata
        .extensions
        .values()
        .map(|ext| (ext.name.as_str(), ext.behavior));

    for (name, behavior) in from_sequence.chain(from_metadata) {
        if name == reserved::WILDCARD_EXTENSION {
            if matches!(
                behavior,
                ExtensionBehavior::Require | ExtensionBehavior::Enable
            ) {
                queue.push(
                    Diagnostic::error(ErrorCode::E1006)
                        .with_message(format!(
                            "extension `all` cannot have `{behavior}` behavior"
                        ))
                        .with_file(file),
                );
            }
        } else if !reserved::SUPPORTED_EXTENSIONS.contains(&name) {
            queue.push(
                Diagnostic::error(ErrorCode::E1005)
                    .with_message(format!("unsupported extension `{name}`"))
                    .with_file(file),
            );
        }
    }
}
