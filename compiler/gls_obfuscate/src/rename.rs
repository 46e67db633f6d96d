//! The renaming pass.
//!
//! One forward walk over the main sequence assigns every eligible
//! declaration its short name, then a second walk rewrites usages through
//! the resolver so shadowing is honored exactly as the analysis saw it.
//! Renaming is text-only: node structure, uids and the index stay valid.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::debug;

use gls_ast::{reserved, NodeIndex, NodeKind, Qualifier, SyntaxTree, UnitMetadata};
use gls_collect::{
    resolve, resolve_field, DeclKind, MainSequence, ScopeId, SequenceEvent, UsageKind,
};

use crate::automaton::{adjudicate, Fate};
use crate::generate::NameGenerator;
use crate::shared::SharedNameTable;
use crate::ObfuscateError;

/// Module-scope original name -> renamed, for graph-condition patching.
pub type RenameMap = BTreeMap<String, String>;

/// Rename every eligible identifier in one file.
pub fn obfuscate(
    tree: &mut SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
    shared: &mut SharedNameTable,
    metadata: &UnitMetadata,
) -> Result<RenameMap, ObfuscateError> {
    if !index.is_current(tree) {
        return Err(ObfuscateError::StaleIndex);
    }

    let fates = adjudicate_all(seq)?;
    let kept = kept_names(seq, &fates, metadata);

    let mut generator = NameGenerator::new(banned_names(seq, metadata));
    generator.block(shared.claimed_ranges());

    // Varying names other files already minted are taken before this file
    // assigns anything: a module-scope mint landing on one would collide
    // with the varying's verbatim reuse later in the walk.
    let used: FxHashSet<String> = shared.varying_renames().map(str::to_owned).collect();

    let mut renamer = Renamer {
        generator,
        fates,
        kept,
        used,
        by_key: BTreeMap::new(),
        by_pos: BTreeMap::new(),
        field_names: BTreeMap::new(),
        rename_map: RenameMap::new(),
        frames: Vec::new(),
    };

    renamer.assign(tree, index, seq, shared)?;
    renamer.rewrite_usages(tree, index, seq);
    debug!(renamed = renamer.by_pos.len(), "obfuscation finished");
    Ok(renamer.rename_map)
}

type GroupKey = (String, ScopeId);

/// Fold every declaration group's qualifiers through the automaton.
fn adjudicate_all(seq: &MainSequence) -> Result<BTreeMap<GroupKey, Fate>, ObfuscateError> {
    let mut qualifiers: BTreeMap<GroupKey, Vec<Qualifier>> = BTreeMap::new();
    for event in seq.iter() {
        if let SequenceEvent::Declaration(decl) = event {
            qualifiers
                .entry((decl.name.clone(), decl.scope))
                .or_default()
                .push(decl.qualifier);
        }
    }
    let mut fates = BTreeMap::new();
    for ((name, scope), list) in qualifiers {
        let fate = adjudicate(list);
        if fate == Fate::Error {
            return Err(ObfuscateError::QualifierCollision { name });
        }
        fates.insert((name, scope), fate);
    }
    Ok(fates)
}

/// Names that keep their spelling in this file: skipped declarations and
/// unresolved references to host-side symbols. Fresh names must not collide
/// with any of them.
fn kept_names(
    seq: &MainSequence,
    fates: &BTreeMap<GroupKey, Fate>,
    metadata: &UnitMetadata,
) -> FxHashSet<String> {
    let mut kept: FxHashSet<String> = metadata.reserved_idents.iter().cloned().collect();
    for (pos, event) in seq.enumerated() {
        match event {
            SequenceEvent::Declaration(decl) => {
                let fate = fates.get(&(decl.name.clone(), decl.scope));
                if !decl.obfuscation_allowed || fate == Some(&Fate::Skip) {
                    kept.insert(decl.name.clone());
                }
            }
            SequenceEvent::Usage(usage)
                if usage.kind != UsageKind::FieldAccess && !usage.reserved =>
            {
                if resolve(seq, pos, &usage.name).is_none() {
                    kept.insert(usage.name.clone());
                }
            }
            _ => {}
        }
    }
    kept
}

/// Extension-reserved builtins plus the unit's pinned identifiers.
fn banned_names(seq: &MainSequence, metadata: &UnitMetadata) -> FxHashSet<String> {
    let mut banned: FxHashSet<String> = metadata.reserved_idents.iter().cloned().collect();
    let names = seq
        .iter()
        .filter_map(|event| match event {
            SequenceEvent::Extension { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .chain(metadata.extensions.values().map(|ext| ext.name.as_str()));
    for extension in names {
        for name in reserved::extension_reserved(extension) {
            banned.insert((*name).to_owned());
        }
    }
    banned
}

/// Include bookkeeping during the assignment walk.
enum Frame {
    /// First processing: remember where the include's range began.
    Recording { name: String, start: u64 },
    /// Re-encounter: counter moved to the recorded start.
    Replaying { name: String, saved: u64, end: u64 },
}

impl Frame {
    fn name(&self) -> &str {
        match self {
            Frame::Recording { name, .. } | Frame::Replaying { name, .. } => name,
        }
    }
}

struct Renamer {
    generator: NameGenerator,
    fates: BTreeMap<GroupKey, Fate>,
    kept: FxHashSet<String>,
    /// Names unavailable for fresh mints: everything handed out in this
    /// file plus varying renames recorded by earlier files.
    used: FxHashSet<String>,
    by_key: BTreeMap<GroupKey, String>,
    /// Declaration position -> new name, for usage rewriting.
    by_pos: BTreeMap<usize, String>,
    /// `(struct decl position, field index)` -> new field name.
    field_names: BTreeMap<(usize, usize), String>,
    rename_map: RenameMap,
    frames: Vec<Frame>,
}

impl Renamer {
    fn replaying(&self) -> bool {
        self.frames
            .iter()
            .any(|f| matches!(f, Frame::Replaying { .. }))
    }

    fn mint(&mut self) -> String {
        let kept = &self.kept;
        let used = &self.used;
        let name = if self.replaying() {
            // Replay must reproduce the first processing exactly, so only
            // the global skip rules apply.
            self.generator.next_name(|_| false)
        } else {
            self.generator
                .next_name(|candidate| kept.contains(candidate) || used.contains(candidate))
        };
        self.used.insert(name.clone());
        name
    }

    fn enter_include(&mut self, name: &str, shared: &SharedNameTable) {
        match shared.include_range(name) {
            Some((start, end)) => {
                self.frames.push(Frame::Replaying {
                    name: name.to_owned(),
                    saved: self.generator.position(),
                    end,
                });
                self.generator.jump_to(start);
                self.generator.set_honor_blocked(false);
            }
            None => {
                self.frames.push(Frame::Recording {
                    name: name.to_owned(),
                    start: self.generator.position(),
                });
            }
        }
    }

    fn leave_include(&mut self, name: &str, shared: &mut SharedNameTable) {
        let Some(at) = self.frames.iter().rposition(|f| f.name() == name) else {
            return;
        };
        match self.frames.remove(at) {
            Frame::Recording { name, start } => {
                shared.record_include(&name, start, self.generator.position());
            }
            Frame::Replaying { saved, end, .. } => {
                // Later names must clear both the outer position and the
                // ids this include claimed in its first file.
                self.generator.jump_to(saved.max(end));
            }
        }
        self.generator.set_honor_blocked(!self.replaying());
    }

    fn assign(
        &mut self,
        tree: &mut SyntaxTree,
        index: &NodeIndex,
        seq: &MainSequence,
        shared: &mut SharedNameTable,
    ) -> Result<(), ObfuscateError> {
        for (pos, event) in seq.enumerated() {
            match event {
                SequenceEvent::IncludeStart { name } => self.enter_include(name, shared),
                SequenceEvent::IncludeEnd { name } => self.leave_include(name, shared),
                SequenceEvent::Declaration(_) => {
                    self.assign_declaration(tree, index, seq, shared, pos)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn assign_declaration(
        &mut self,
        tree: &mut SyntaxTree,
        index: &NodeIndex,
        seq: &MainSequence,
        shared: &mut SharedNameTable,
        pos: usize,
    ) -> Result<(), ObfuscateError> {
        let Some(decl) = seq.declaration(pos) else {
            return Ok(());
        };
        let key = (decl.name.clone(), decl.scope);
        let fate = self.fates.get(&key).copied().unwrap_or(Fate::Obfuscate);
        if !decl.obfuscation_allowed || fate == Fate::Skip {
            return Ok(());
        }

        let renamed = match self.by_key.get(&key) {
            // Preprocessor-duplicated declarations share the first name.
            Some(existing) => existing.clone(),
            None => {
                let as_varying =
                    fate == Fate::ObfuscateAsVarying || decl.qualifier == Qualifier::Varying;
                let fresh = if as_varying && !self.replaying() {
                    match shared.varying(&decl.name) {
                        Some(recorded) => recorded.to_owned(),
                        None => self.mint(),
                    }
                } else {
                    self.mint()
                };
                if as_varying {
                    shared.record_varying(&decl.name, &fresh);
                }
                self.used.insert(fresh.clone());
                self.by_key.insert(key.clone(), fresh.clone());
                fresh
            }
        };

        self.by_pos.insert(pos, renamed.clone());
        if decl.scope == ScopeId::MODULE {
            self.rename_map
                .insert(decl.name.clone(), renamed.clone());
        }
        if let Some(id) = index.lookup(decl.uid) {
            tree.set_text(id, renamed);
        }

        if decl.kind == DeclKind::StructType {
            self.rename_fields(tree, index, seq, pos);
        }
        Ok(())
    }

    /// Struct members use an isolated counter: each struct's field list
    /// restarts from the densest names without disturbing the main stream.
    fn rename_fields(
        &mut self,
        tree: &mut SyntaxTree,
        index: &NodeIndex,
        seq: &MainSequence,
        struct_pos: usize,
    ) {
        let Some(decl) = seq.declaration(struct_pos) else {
            return;
        };
        let fields: Vec<_> = decl
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.uid, f.obfuscation_allowed))
            .collect();

        let saved = self.generator.position();
        self.generator.jump_to(0);
        self.generator.set_honor_blocked(false);
        let mut taken: FxHashSet<String> = FxHashSet::default();
        for (field_index, uid, allowed) in fields {
            if !allowed {
                continue;
            }
            let local = &taken;
            let name = self.generator.next_name(|candidate| local.contains(candidate));
            taken.insert(name.clone());
            self.field_names
                .insert((struct_pos, field_index), name.clone());
            if let Some(id) = index.lookup(uid) {
                tree.set_text(id, name);
            }
        }
        self.generator.jump_to(saved);
        self.generator.set_honor_blocked(!self.replaying());
    }

    fn rewrite_usages(&self, tree: &mut SyntaxTree, index: &NodeIndex, seq: &MainSequence) {
        for (pos, event) in seq.enumerated() {
            let SequenceEvent::Usage(usage) = event else {
                continue;
            };
            if usage.reserved {
                continue;
            }
            let renamed = if usage.kind == UsageKind::FieldAccess {
                resolve_field(tree, index, seq, usage.uid, &usage.name)
                    .and_then(|r| self.field_names.get(&(r.struct_pos, r.field_index)))
            } else {
                resolve(seq, pos, &usage.name).and_then(|decl_pos| self.by_pos.get(&decl_pos))
            };
            let Some(renamed) = renamed else {
                continue;
            };
            let Some(id) = index.lookup(usage.uid) else {
                continue;
            };
            // Type references ride on the declaring node's type slot rather
            // than its text.
            match tree.node(id).kind {
                NodeKind::DeclarationList
                | NodeKind::Param
                | NodeKind::FunctionDef
                | NodeKind::FunctionProto
                | NodeKind::StructField => {
                    tree.node_mut(id).type_name = Some(renamed.clone());
                }
                _ => tree.set_text(id, renamed.clone()),
            }
        }
    }
}
