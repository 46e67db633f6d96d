//! Dead-function and dead-variable analysis.
//!
//! Functions: a per-file call graph keyed by name, mark-and-sweep from the
//! entry point. Variables: a declaration is alive iff a later usage resolves
//! to it through the scope chain. Both report into the build ledger rather
//! than emitting diagnostics directly, so cross-file merging can overturn a
//! local "dead" verdict.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use gls_collect::{resolve, DeclKind, MainSequence, ScopeId, ScopeKind, SequenceEvent, UsageKind};
use gls_ast::{reserved, Qualifier};

use crate::ledger::{DeadCodeLedger, Origin};

struct FnInfo {
    origin: Origin,
    callees: BTreeSet<String>,
    defined: bool,
}

/// Analyze function reachability for one file and feed the ledger.
pub fn check_dead_functions(file: &str, seq: &MainSequence, ledger: &mut DeadCodeLedger) {
    let mut functions: BTreeMap<String, FnInfo> = BTreeMap::new();
    let mut module_roots: BTreeSet<String> = BTreeSet::new();

    // Build the per-file call graph: name -> direct callee names.
    let mut pending_function: Option<String> = None;
    let mut current: Option<(String, ScopeId)> = None;
    for event in seq.iter() {
        match event {
            SequenceEvent::Declaration(decl) if decl.kind.is_function() => {
                let origin = match &decl.include {
                    Some(include) => Origin::include(include.clone()),
                    None => Origin::main_file(file),
                };
                let info = functions.entry(decl.name.clone()).or_insert(FnInfo {
                    origin,
                    callees: BTreeSet::new(),
                    defined: false,
                });
                if decl.kind == DeclKind::FunctionDef {
                    info.defined = true;
                    pending_function = Some(decl.name.clone());
                }
            }
            SequenceEvent::ScopeStart {
                scope,
                kind: ScopeKind::Function,
            } => {
                if let Some(name) = pending_function.take() {
                    current = Some((name, *scope));
                }
            }
            SequenceEvent::ScopeEnd { scope } => {
                if current.as_ref().is_some_and(|(_, s)| s == scope) {
                    current = None;
                }
            }
            SequenceEvent::Usage(usage) if usage.kind == UsageKind::FunctionCall => {
                match &current {
                    Some((caller, _)) => {
                        if let Some(info) = functions.get_mut(caller) {
                            info.callees.insert(usage.name.clone());
                        }
                    }
                    // Calls in module-scope initializers are always live.
                    None => {
                        module_roots.insert(usage.name.clone());
                    }
                }
            }
            _ => {}
        }
    }

    // Mark-and-sweep from the entry point.
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(reserved::ENTRY_POINT.to_owned());
    queue.extend(module_roots);
    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let Some(info) = functions.get(&name) {
            for callee in &info.callees {
                if !visited.contains(callee) {
                    queue.push_back(callee.clone());
                }
            }
        }
    }

    for (name, info) in functions {
        if name == reserved::ENTRY_POINT {
            continue;
        }
        let dead = info.defined && !visited.contains(&name);
        debug!(function = %name, dead, "function reachability");
        ledger.report_function(info.origin, &name, dead);
    }
}

/// Analyze variable liveness for one file and feed the ledger.
///
/// Include-sourced declarations are keyed by their include-relative
/// nested-scope path instead of the raw scope id, which differs every time
/// the include is re-parsed into another file.
pub fn check_dead_variables(file: &str, seq: &MainSequence, ledger: &mut DeadCodeLedger) {
    // Scope path bookkeeping: one sibling counter per nesting level.
    let mut path: Vec<u32> = Vec::new();
    let mut counters: Vec<u32> = vec![0];
    let mut include_depths: Vec<(String, usize)> = Vec::new();

    // Candidate declarations: position -> (origin, scope key, name).
    let mut candidates: BTreeMap<usize, (Origin, String, String)> = BTreeMap::new();
    let mut alive: BTreeSet<usize> = BTreeSet::new();

    for (pos, event) in seq.enumerated() {
        match event {
            SequenceEvent::ScopeStart { .. } => {
                if let Some(counter) = counters.last_mut() {
                    path.push(*counter);
                    *counter += 1;
                }
                counters.push(0);
            }
            SequenceEvent::ScopeEnd { .. } => {
                path.pop();
                counters.pop();
            }
            SequenceEvent::IncludeStart { name } => {
                include_depths.push((name.clone(), path.len()));
            }
            SequenceEvent::IncludeEnd { name } => {
                if let Some(at) = include_depths.iter().rposition(|(n, _)| n == name) {
                    include_depths.truncate(at);
                }
            }
            SequenceEvent::Declaration(decl)
                if decl.kind == DeclKind::Variable
                    && matches!(decl.qualifier, Qualifier::None | Qualifier::Const) =>
            {
                let (origin, scope_key) = match include_depths.last() {
                    Some((include, depth)) => {
                        let rel: Vec<String> =
                            path[*depth..].iter().map(u32::to_string).collect();
                        (Origin::include(include.clone()), rel.join("."))
                    }
                    None => (Origin::main_file(file), decl.scope.0.to_string()),
                };
                candidates.insert(pos, (origin, scope_key, decl.name.clone()));
            }
            SequenceEvent::Usage(usage) if usage.kind == UsageKind::Variable => {
                if let Some(decl_pos) = resolve(seq, pos, &usage.name) {
                    alive.insert(decl_pos);
                }
            }
            _ => {}
        }
    }

    for (pos, (origin, scope_key, name)) in candidates {
        ledger.report_variable(origin, &scope_key, &name, !alive.contains(&pos));
    }
}
