//! Static analysis for the glsc shader compiler.
//!
//! Operates on the collected main sequence: dead-function and dead-variable
//! reachability, import/export contract checking, and extension directive
//! checking. Per-file passes feed build-scoped ledgers; the driver calls
//! the ledgers' `finish` once after the last file to emit the soft
//! diagnostics that can only be decided build-wide.

mod contracts;
mod dead;
mod extensions;
mod ledger;

pub use contracts::check_contracts;
pub use dead::{check_dead_functions, check_dead_variables};
pub use extensions::check_extensions;
pub use ledger::{ContractLedger, DeadCodeLedger, Origin};

use gls_ast::{NodeIndex, SyntaxTree, UnitMetadata};
use gls_collect::MainSequence;
use gls_diagnostic::DiagnosticQueue;

/// Run every validation pass for one file.
pub fn validate(
    file: &str,
    tree: &SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
    metadata: &UnitMetadata,
    dead_ledger: &mut DeadCodeLedger,
    contract_ledger: &mut ContractLedger,
    queue: &mut DiagnosticQueue,
) {
    tracing::debug!(file, "validating");
    check_dead_functions(file, seq, dead_ledger);
    check_dead_variables(file, seq, dead_ledger);
    check_contracts(file, tree, index, seq, metadata, contract_ledger, queue);
    check_extensions(file, seq, metadata, queue);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gls_ast::{build, ContractSpec, NodeKind};
    use gls_collect::collect;
    use pretty_assertions::assert_eq;

    #[test]
    fn undeclared_identifier_is_an_error() {
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let usage = build::ident(&mut tree, "phantom");
        let stmt = build::expr_stmt(&mut tree, usage);
        let main = build::function(&mut tree, "void", "main", vec![], vec![stmt]);
        tree.push_child(root, main);
        let index = NodeIndex::recompute(&mut tree);
        let metadata = UnitMetadata::default();
        let seq = collect(&tree, &index, &metadata).unwrap();

        let mut queue = DiagnosticQueue::new();
        let mut dead = DeadCodeLedger::default();
        let mut contracts = ContractLedger::default();
        validate(
            "f.glsl", &tree, &index, &seq, &metadata, &mut dead, &mut contracts, &mut queue,
        );
        assert!(queue.has_errors());
        let first = queue.iter().find(|d| d.is_error()).unwrap();
        assert_eq!(first.message, "undeclared identifier `phantom`");
    }

    #[test]
    fn swizzle_access_is_not_undeclared() {
        // vec3 v; v.xyz;
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let v = build::var(&mut tree, "vec3", "v", None);
        let recv = build::ident(&mut tree, "v");
        let access = build::field(&mut tree, recv, "xyz");
        let stmt = build::expr_stmt(&mut tree, access);
        let main = build::function(&mut tree, "void", "main", vec![], vec![v, stmt]);
        tree.push_child(root, main);
        let index = NodeIndex::recompute(&mut tree);
        let metadata = UnitMetadata::default();
        let seq = collect(&tree, &index, &metadata).unwrap();

        let mut queue = DiagnosticQueue::new();
        let mut dead = DeadCodeLedger::default();
        let mut contracts = ContractLedger::default();
        validate(
            "f.glsl", &tree, &index, &seq, &metadata, &mut dead, &mut contracts, &mut queue,
        );
        assert!(!queue.has_errors());
    }

    #[test]
    fn declared_import_suppresses_undeclared_error() {
        // Inside common.glsl a usage of `host_value`, which its contract
        // imports. The export half lives in another include that is
        // registered separately.
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let usage = build::ident(&mut tree, "host_value");
        let stmt = build::expr_stmt(&mut tree, usage);
        build::with_comment(&mut tree, stmt, "@include-begin common.glsl");
        tree.push_child(root, stmt);
        let index = NodeIndex::recompute(&mut tree);
        let mut metadata = UnitMetadata::default();
        metadata.import_export.insert(
            "common.glsl".into(),
            ContractSpec {
                exports: vec![],
                imports: vec!["host_value".into()],
            },
        );
        let seq = collect(&tree, &index, &metadata).unwrap();

        let mut queue = DiagnosticQueue::new();
        let mut dead = DeadCodeLedger::default();
        let mut contracts = ContractLedger::default();
        contracts.register("host.glsl", &["host_value".into()], &[]);
        validate(
            "f.glsl", &tree, &index, &seq, &metadata, &mut dead, &mut contracts, &mut queue,
        );
        assert!(!queue.has_errors());

        // The import is satisfied by host.glsl's export; the export remains
        // unreferenced only if nothing consumed it, and the import side did.
        let final_diags = contracts.finish();
        assert!(final_diags.iter().all(|d| !d.is_error()), "{final_diags:?}");
    }

    #[test]
    fn export_referenced_from_main_file_is_used() {
        // common.glsl declares `shared_f`; the main file calls it.
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let shared = build::function(&mut tree, "float", "shared_f", vec![], vec![]);
        build::with_comment(&mut tree, shared, "@include-begin common.glsl");
        let closer = build::var(&mut tree, "float", "after_include", None);
        build::with_comment(&mut tree, closer, "@include-end common.glsl");
        let call = build::call(&mut tree, "shared_f", vec![]);
        let stmt = build::expr_stmt(&mut tree, call);
        let main = build::function(&mut tree, "void", "main", vec![], vec![stmt]);
        tree.push_child(root, shared);
        tree.push_child(root, closer);
        tree.push_child(root, main);

        let index = NodeIndex::recompute(&mut tree);
        let mut metadata = UnitMetadata::default();
        metadata.import_export.insert(
            "common.glsl".into(),
            ContractSpec {
                exports: vec!["shared_f".into()],
                imports: vec![],
            },
        );
        let seq = collect(&tree, &index, &metadata).unwrap();

        let mut queue = DiagnosticQueue::new();
        let mut dead = DeadCodeLedger::default();
        let mut contracts = ContractLedger::default();
        validate(
            "f.glsl", &tree, &index, &seq, &metadata, &mut dead, &mut contracts, &mut queue,
        );
        assert!(!queue.has_errors());
        assert!(contracts.finish().iter().all(|d| !d.is_error()));
    }

    #[test]
    fn unused_export_is_an_error_after_finish() {
        let mut contracts = ContractLedger::default();
        contracts.register("common.glsl", &["never_used".into()], &[]);
        let diags = contracts.finish();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
    }
}
