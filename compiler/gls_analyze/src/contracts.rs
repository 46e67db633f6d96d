//! Import/export contract checking.
//!
//! Includes declare what they export and what they expect their host to
//! provide. A usage inside an include that resolves to an outside
//! declaration consumes an import; an include-declared name referenced from
//! outside consumes an export. Anything unresolved that is neither a
//! declared import nor a swizzle is an undeclared identifier.

use gls_ast::{reserved, NodeIndex, SyntaxTree, UnitMetadata};
use gls_collect::{resolve, resolve_field, MainSequence, SequenceEvent, UsageKind};
use gls_diagnostic::{undeclared_identifier, DiagnosticQueue};

use crate::ledger::ContractLedger;

/// Check every usage in one file against the scope chain and the contract
/// ledger. Hard errors go straight onto the queue.
pub fn check_contracts(
    file: &str,
    tree: &SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
    metadata: &UnitMetadata,
    ledger: &mut ContractLedger,
    queue: &mut DiagnosticQueue,
) {
    for (include, contract) in &metadata.import_export {
        ledger.register(include, &contract.exports, &contract.imports);
    }

    for (pos, event) in seq.enumerated() {
        let SequenceEvent::Usage(usage) = event else {
            continue;
        };
        if usage.reserved {
            continue;
        }

        let resolved = match usage.kind {
            UsageKind::FieldAccess => {
                match resolve_field(tree, index, seq, usage.uid, &usage.name) {
                    // The owning struct's include attribution stands in for
                    // the field's.
                    Some(res) => {
                        seq.declaration(res.struct_pos).map(|d| d.include.clone())
                    }
                    None => None,
                }
            }
            _ => resolve(seq, pos, &usage.name)
                .and_then(|decl_pos| seq.declaration(decl_pos))
                .map(|decl| decl.include.clone()),
        };

        match resolved {
            Some(decl_include) => {
                // Export consumption: include-declared, referenced outside.
                if let Some(provider) = &decl_include {
                    if usage.include.as_deref() != Some(provider.as_str()) {
                        ledger.mark_export_used(provider, &usage.name);
                    }
                }
                // Import consumption: used inside an include, declared out.
                if let Some(consumer) = &usage.include {
                    if decl_include.as_deref() != Some(consumer.as_str())
                        && ledger.is_import(consumer, &usage.name)
                    {
                        ledger.mark_import_used(consumer, &usage.name);
                    }
                }
            }
            None => {
                if usage.kind == UsageKind::FieldAccess && reserved::is_swizzle(&usage.name) {
                    continue;
                }
                if let Some(consumer) = &usage.include {
                    if ledger.is_import(consumer, &usage.name) {
                        ledger.mark_import_used(consumer, &usage.name);
                        continue;
                    }
                }
                queue.push(undeclared_identifier(file, &usage.name));
            }
        }
    }
}
