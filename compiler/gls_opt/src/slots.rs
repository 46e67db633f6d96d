//! Register-style reuse of local variable slots.
//!
//! Function-local scalar and vector temporaries with disjoint live ranges
//! collapse onto shared synthetic slots (`_{type}_tmp{n}`), declared once at
//! the top of the function body. Liveness is read off the main sequence: a
//! candidate dies at its final resolving reference, deferred to the end of
//! any enclosing `@section` region so host-side substitution inside the
//! region cannot observe a reused slot.
//!
//! This pass is structural; the caller must recompute the index and
//! re-collect the sequence afterwards.

use std::collections::BTreeMap;

use tracing::debug;

use gls_ast::{build, NodeId, NodeIndex, NodeKind, Qualifier, SyntaxTree, Uid};
use gls_collect::{resolve, DeclKind, MainSequence, ScopeKind, SequenceEvent, UsageKind};

use crate::OptError;

/// Run slot reuse over every function in the tree.
///
/// Returns the number of declarations folded onto slots. Zero means the
/// tree was not mutated.
pub fn reuse_slots(
    tree: &mut SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
) -> Result<usize, OptError> {
    if !index.is_current(tree) {
        return Err(OptError::StaleIndex);
    }

    let sections = section_intervals(seq);
    let mut folded = 0;
    for region in function_regions(tree, index, seq) {
        folded += reuse_in_function(tree, index, seq, &sections, &region)?;
    }
    debug!(folded, "slot reuse finished");
    Ok(folded)
}

/// `(start, end)` sequence positions of one function scope plus its body
/// block node.
struct FunctionRegion {
    start: usize,
    end: usize,
    body: NodeId,
}

fn function_regions(tree: &SyntaxTree, index: &NodeIndex, seq: &MainSequence) -> Vec<FunctionRegion> {
    let mut regions = Vec::new();
    let mut pending_def: Option<Uid> = None;
    for (pos, event) in seq.enumerated() {
        match event {
            SequenceEvent::Declaration(decl) if decl.kind == DeclKind::FunctionDef => {
                pending_def = Some(decl.uid);
            }
            SequenceEvent::ScopeStart {
                scope,
                kind: ScopeKind::Function,
            } => {
                let Some(fn_uid) = pending_def.take() else {
                    continue;
                };
                let Some(end) = seq.enumerated().skip(pos).find_map(|(p, e)| {
                    matches!(e, SequenceEvent::ScopeEnd { scope: s } if s == scope).then_some(p)
                }) else {
                    continue;
                };
                let Some(fn_id) = index.lookup(fn_uid) else {
                    continue;
                };
                let Some(&body) = tree.node(fn_id).children.last() else {
                    continue;
                };
                if tree.node(body).kind == NodeKind::Block {
                    regions.push(FunctionRegion { start: pos, end, body });
                }
            }
            _ => {}
        }
    }
    regions
}

/// `@section` regions as `(start, end)` position intervals.
fn section_intervals(seq: &MainSequence) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut intervals = Vec::new();
    for (pos, event) in seq.enumerated() {
        match event {
            SequenceEvent::SectionStart => open.push(pos),
            SequenceEvent::SectionEnd => {
                if let Some(start) = open.pop() {
                    intervals.push((start, pos));
                }
            }
            _ => {}
        }
    }
    intervals
}

/// A reference inside a section region lives until the region closes.
fn deferred(sections: &[(usize, usize)], pos: usize) -> usize {
    sections
        .iter()
        .filter(|&&(start, end)| start < pos && pos < end)
        .map(|&(_, end)| end)
        .max()
        .unwrap_or(pos)
}

struct Candidate {
    declarator: NodeId,
    list: NodeId,
    type_name: String,
    /// Position after which the slot is free again.
    retire: usize,
    /// Ident nodes that resolve to this declaration.
    usages: Vec<NodeId>,
}

fn reuse_in_function(
    tree: &mut SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
    sections: &[(usize, usize)],
    region: &FunctionRegion,
) -> Result<usize, OptError> {
    let mut candidates = collect_candidates(tree, index, seq, sections, region)?;
    drop_partial_lists(tree, &mut candidates);
    if candidates.is_empty() {
        return Ok(0);
    }

    // Allocation: forward walk with a per-type free list.
    let mut free: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut counters: BTreeMap<String, u32> = BTreeMap::new();
    let mut minted: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut schedule: BTreeMap<usize, Vec<(String, String)>> = BTreeMap::new();
    let mut slot_of: BTreeMap<usize, String> = BTreeMap::new();

    for (&pos, candidate) in &candidates {
        let expired: Vec<usize> = schedule.range(..pos).map(|(&p, _)| p).collect();
        for p in expired {
            for (ty, slot) in schedule.remove(&p).unwrap_or_default() {
                free.entry(ty).or_default().push(slot);
            }
        }
        let ty = candidate.type_name.clone();
        let slot = match free.get_mut(&ty).and_then(Vec::pop) {
            Some(reused) => reused,
            None => {
                let counter = counters.entry(ty.clone()).or_insert(0);
                let name = format!("_{ty}_tmp{counter}");
                *counter += 1;
                minted.entry(ty.clone()).or_default().push(name.clone());
                name
            }
        };
        schedule
            .entry(candidate.retire)
            .or_default()
            .push((ty, slot.clone()));
        slot_of.insert(pos, slot);
    }

    // Usage rewrites are text-only and safe before the structural phase.
    for (pos, candidate) in &candidates {
        if let Some(slot) = slot_of.get(pos) {
            for &usage in &candidate.usages {
                tree.set_text(usage, slot.clone());
            }
        }
    }

    rewrite_declarations(tree, index, &candidates, &slot_of);
    hoist_slot_declarations(tree, region.body, &minted);
    Ok(slot_of.len())
}

fn collect_candidates(
    tree: &SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
    sections: &[(usize, usize)],
    region: &FunctionRegion,
) -> Result<BTreeMap<usize, Candidate>, OptError> {
    let mut candidates: BTreeMap<usize, Candidate> = BTreeMap::new();
    for pos in region.start..=region.end {
        match &seq[pos] {
            SequenceEvent::Declaration(decl)
                if decl.kind == DeclKind::Variable
                    && decl.qualifier == Qualifier::None
                    && !decl.loop_init
                    && !decl.array
                    && !decl.protected
                    // User-struct temporaries keep their declarations;
                    // only builtin-typed locals fold onto slots.
                    && gls_ast::reserved::is_reserved(&decl.type_name) =>
            {
                let declarator = index.lookup(decl.uid).ok_or(OptError::StaleIndex)?;
                let Some(list) =
                    index.nearest_ancestor(tree, decl.uid, &[NodeKind::DeclarationList])
                else {
                    continue;
                };
                candidates.insert(
                    pos,
                    Candidate {
                        declarator,
                        list,
                        type_name: decl.type_name.clone(),
                        retire: pos,
                        usages: Vec::new(),
                    },
                );
            }
            SequenceEvent::Usage(usage) if usage.kind == UsageKind::Variable => {
                let Some(decl_pos) = resolve(seq, pos, &usage.name) else {
                    continue;
                };
                if let Some(candidate) = candidates.get_mut(&decl_pos) {
                    let id = index.lookup(usage.uid).ok_or(OptError::StaleIndex)?;
                    candidate.usages.push(id);
                    candidate.retire = candidate.retire.max(deferred(sections, pos));
                }
            }
            _ => {}
        }
    }
    Ok(candidates)
}

/// A declaration list is only foldable as a whole. Lists with a mix of
/// candidate and excluded declarators keep all of their declarators.
fn drop_partial_lists(tree: &SyntaxTree, candidates: &mut BTreeMap<usize, Candidate>) {
    let mut per_list: BTreeMap<u32, usize> = BTreeMap::new();
    for candidate in candidates.values() {
        *per_list.entry(candidate.list.0).or_insert(0) += 1;
    }
    candidates.retain(|_, candidate| {
        let total = tree.node(candidate.list).children.len();
        per_list.get(&candidate.list.0).copied() == Some(total)
    });
}

/// Replace each foldable declaration statement with assignment statements;
/// uninitialized declarations disappear entirely.
fn rewrite_declarations(
    tree: &mut SyntaxTree,
    index: &NodeIndex,
    candidates: &BTreeMap<usize, Candidate>,
    slot_of: &BTreeMap<usize, String>,
) {
    // Per block: child position of each list and its (slot, initializer)
    // pairs, resolved against the pre-edit tree.
    struct ListEdit {
        at: usize,
        replacements: Vec<(String, Option<NodeId>)>,
    }
    let mut per_block: BTreeMap<u32, Vec<ListEdit>> = BTreeMap::new();
    let mut seen_lists: Vec<NodeId> = Vec::new();

    for candidate in candidates.values() {
        if seen_lists.contains(&candidate.list) {
            continue;
        }
        seen_lists.push(candidate.list);

        let Some(list_uid) = tree.node(candidate.list).uid else {
            continue;
        };
        let Some(block) = index.nearest_ancestor(tree, list_uid, &[NodeKind::Block]) else {
            continue;
        };
        let Some(at) = tree.child_position(block, candidate.list) else {
            continue;
        };
        let declarators = tree.node(candidate.list).children.clone();
        let replacements = declarators
            .iter()
            .filter_map(|&d| {
                let slot = candidates
                    .iter()
                    .find(|(_, c)| c.declarator == d)
                    .and_then(|(p, _)| slot_of.get(p))?;
                Some((slot.clone(), tree.node(d).children.first().copied()))
            })
            .collect();
        per_block
            .entry(block.0)
            .or_default()
            .push(ListEdit { at, replacements });
    }

    for (block_raw, mut edits) in per_block {
        let block = NodeId(block_raw);
        edits.sort_by(|a, b| b.at.cmp(&a.at));
        for edit in edits {
            tree.remove_child(block, edit.at);
            let mut insert_at = edit.at;
            for (slot, init) in edit.replacements {
                let Some(init) = init else { continue };
                let target = build::ident(tree, &slot);
                let set = build::assign(tree, "=", target, init);
                let stmt = build::expr_stmt(tree, set);
                tree.insert_child(block, insert_at, stmt);
                insert_at += 1;
            }
        }
    }
}

/// One consolidated declaration per slot type at the top of the body.
fn hoist_slot_declarations(
    tree: &mut SyntaxTree,
    body: NodeId,
    minted: &BTreeMap<String, Vec<String>>,
) {
    let mut insert_at = 0;
    for (ty, slots) in minted {
        let declarators = slots
            .iter()
            .map(|slot| build::declarator(tree, slot, None))
            .collect();
        let list = build::decl(tree, Qualifier::None, ty, declarators);
        tree.node_mut(list).hoisted_decl = true;
        tree.insert_child(body, insert_at, list);
        insert_at += 1;
    }
}
