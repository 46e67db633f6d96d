//! Cross-file analysis ledgers.
//!
//! Dead-code results cannot be finalized per file: an include's helper may
//! look dead in the first file that splices it and be called from the
//! second. The ledgers accumulate claims across the whole build; the merge
//! rule is one-way — once any file proves a name alive, it stays alive and
//! later "dead" claims are discarded. The driver drains the ledgers once
//! after the last file.

use std::collections::{BTreeMap, BTreeSet};

use gls_diagnostic::{Diagnostic, ErrorCode};

/// Where a declaration comes from: the main file itself or a named include.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct Origin {
    pub name: String,
    pub is_include: bool,
}

impl Origin {
    pub fn main_file(name: impl Into<String>) -> Self {
        Origin {
            name: name.into(),
            is_include: false,
        }
    }

    pub fn include(name: impl Into<String>) -> Self {
        Origin {
            name: name.into(),
            is_include: true,
        }
    }
}

/// Accumulated dead-function and dead-variable claims for one build.
#[derive(Clone, Debug, Default)]
pub struct DeadCodeLedger {
    dead_functions: BTreeSet<(Origin, String)>,
    alive_functions: BTreeSet<(Origin, String)>,
    /// Keyed by `(origin, scope key, name)`; for includes the scope key is
    /// the include-relative nested-scope path, which is stable across
    /// re-parses of the same include.
    dead_variables: BTreeSet<(Origin, String, String)>,
    alive_variables: BTreeSet<(Origin, String, String)>,
}

impl DeadCodeLedger {
    /// Record one file's verdict on a function.
    pub fn report_function(&mut self, origin: Origin, name: &str, dead: bool) {
        let key = (origin, name.to_owned());
        if dead {
            if !self.alive_functions.contains(&key) {
                self.dead_functions.insert(key);
            }
        } else {
            self.dead_functions.remove(&key);
            self.alive_functions.insert(key);
        }
    }

    /// Record one file's verdict on a variable.
    pub fn report_variable(&mut self, origin: Origin, scope_key: &str, name: &str, dead: bool) {
        let key = (origin, scope_key.to_owned(), name.to_owned());
        if dead {
            if !self.alive_variables.contains(&key) {
                self.dead_variables.insert(key);
            }
        } else {
            self.dead_variables.remove(&key);
            self.alive_variables.insert(key);
        }
    }

    /// Emit the surviving claims as warnings.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for (origin, name) in self.dead_functions {
            out.push(
                Diagnostic::warning(ErrorCode::E1007)
                    .with_message(format!("function `{name}` is never called"))
                    .with_file(origin.name),
            );
        }
        for (origin, _scope, name) in self.dead_variables {
            out.push(
                Diagnostic::warning(ErrorCode::E1008)
                    .with_message(format!("variable `{name}` is never used"))
                    .with_file(origin.name),
            );
        }
        out
    }
}

/// Accumulated import/export usage for every include seen in the build.
#[derive(Clone, Debug, Default)]
pub struct ContractLedger {
    /// Include name -> export name -> referenced from outside?
    exports: BTreeMap<String, BTreeMap<String, bool>>,
    /// Include name -> import name -> satisfied by an outside declaration?
    imports: BTreeMap<String, BTreeMap<String, bool>>,
}

impl ContractLedger {
    /// Register an include's declared contract. Idempotent across files.
    pub fn register(&mut self, include: &str, exports: &[String], imports: &[String]) {
        let slot = self.exports.entry(include.to_owned()).or_default();
        for name in exports {
            slot.entry(name.clone()).or_insert(false);
        }
        let slot = self.imports.entry(include.to_owned()).or_default();
        for name in imports {
            slot.entry(name.clone()).or_insert(false);
        }
    }

    /// Whether `name` is a declared import of `include`.
    pub fn is_import(&self, include: &str, name: &str) -> bool {
        self.imports
            .get(include)
            .is_some_and(|m| m.contains_key(name))
    }

    /// Mark an export as referenced from outside its include.
    pub fn mark_export_used(&mut self, include: &str, name: &str) {
        if let Some(entry) = self
            .exports
            .get_mut(include)
            .and_then(|m| m.get_mut(name))
        {
            *entry = true;
        }
    }

    /// Mark an import as resolved against an outside declaration.
    pub fn mark_import_used(&mut self, include: &str, name: &str) {
        if let Some(entry) = self
            .imports
            .get_mut(include)
            .and_then(|m| m.get_mut(name))
        {
            *entry = true;
        }
    }

    /// Whether any include in the build exports `name`.
    pub fn is_exported_anywhere(&self, name: &str) -> bool {
        self.exports.values().any(|m| m.contains_key(name))
    }

    /// Emit contract diagnostics: unused exports are hard errors, unused
    /// imports are warnings, used imports with no exporting counterpart
    /// anywhere in the build are unresolved.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let exported_names: BTreeSet<&String> =
            self.exports.values().flat_map(|m| m.keys()).collect();
        let mut consumed_imports: BTreeSet<&String> = BTreeSet::new();
        for (include, entries) in &self.imports {
            for (name, used) in entries {
                if *used && !exported_names.contains(name) {
                    out.push(gls_diagnostic::unresolved_import(include, name));
                } else if !*used {
                    out.push(
                        Diagnostic::warning(ErrorCode::E1004)
                            .with_message(format!("import `{name}` is never used"))
                            .with_file(include.clone()),
                    );
                } else {
                    consumed_imports.insert(name);
                }
            }
        }
        for (include, entries) in &self.exports {
            for (name, used) in entries {
                // A used import of the same name counts as a reference even
                // when the resolution happened in a file that never saw the
                // exporting include spliced in.
                if !used && !consumed_imports.contains(name) {
                    out.push(
                        Diagnostic::error(ErrorCode::E1003)
                            .with_message(format!("export `{name}` is never referenced"))
                            .with_file(include.clone()),
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn alive_verdict_is_permanent() {
        let mut ledger = DeadCodeLedger::default();
        let origin = Origin::include("common.glsl");
        ledger.report_function(origin.clone(), "helper", true);
        ledger.report_function(origin.clone(), "helper", false);
        // A later dead claim must be discarded.
        ledger.report_function(origin, "helper", true);
        assert_eq!(ledger.finish().len(), 0);
    }

    #[test]
    fn dead_claims_survive_when_never_contradicted() {
        let mut ledger = DeadCodeLedger::default();
        ledger.report_function(Origin::main_file("a.glsl"), "unused", true);
        ledger.report_variable(Origin::main_file("a.glsl"), "1", "tmp", true);
        let diags = ledger.finish();
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn contract_finish_flags_unused_and_violations() {
        let mut ledger = ContractLedger::default();
        ledger.register(
            "lighting.glsl",
            &["specular".into()],
            &["normal".into(), "phantom".into()],
        );
        ledger.mark_import_used("lighting.glsl", "phantom");

        let diags = ledger.finish();
        // unused export `specular` (error), unused import `normal`
        // (warning), `phantom` used but exported nowhere (error).
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.iter().filter(|d| d.is_error()).count(), 2);
    }

    #[test]
    fn unresolved_import_blames_the_missing_exporter() {
        let mut ledger = ContractLedger::default();
        ledger.register("lighting.glsl", &[], &["phantom".into()]);
        ledger.mark_import_used("lighting.glsl", "phantom");

        let diags = ledger.finish();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].to_string(),
            "lighting.glsl: error [E1002]: `phantom` is imported by `lighting.glsl` but no include exports it"
        );
    }
}
