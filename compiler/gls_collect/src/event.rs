//! Sequence events and the main sequence.
//!
//! The collector reduces the tree to a flat, ordered list of semantic
//! events. Every later pass traverses this list, never the raw tree, and
//! reaches back into the tree only through `Uid` references when it must
//! mutate or re-locate nodes.

use gls_ast::{ExtensionBehavior, Qualifier, Uid};

/// Lexical scope identifier. 0 is the module/global scope; ids increase
/// monotonically in entry order, so a child scope's id exceeds its parent's.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const MODULE: ScopeId = ScopeId(0);
}

/// What construct opened a scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    Function,
    Block,
    Loop,
    Struct,
}

/// Declaration kinds, one per declaration-shaped node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    Variable,
    Param,
    FunctionProto,
    FunctionDef,
    StructType,
    StructField,
}

impl DeclKind {
    pub fn is_function(self) -> bool {
        matches!(self, DeclKind::FunctionProto | DeclKind::FunctionDef)
    }
}

/// Identifier usage kinds, one per usage-shaped node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UsageKind {
    Variable,
    FieldAccess,
    FunctionCall,
    StructTypeRef,
    InvariantRedecl,
}

/// One declaration event.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DeclRecord {
    pub kind: DeclKind,
    pub name: String,
    pub uid: Uid,
    pub type_name: String,
    pub qualifier: Qualifier,
    /// Scope the declaration is made in (on the chain at its position).
    pub scope: ScopeId,
    /// Include file the declaration originates from, if any.
    pub include: Option<String>,
    /// Name is in the static reserved table.
    pub reserved: bool,
    /// Eligible for renaming: not reserved, not part of the host contract
    /// (uniform/attribute), not pinned.
    pub obfuscation_allowed: bool,
    /// Declared in a `for` initializer (excluded from slot reuse).
    pub loop_init: bool,
    /// Array-typed (excluded from slot reuse).
    pub array: bool,
    /// Under a protected substitution span (excluded from slot reuse).
    pub protected: bool,
    /// Struct member declarations, folded in by post-processing.
    pub fields: Vec<DeclRecord>,
}

/// One identifier usage event.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct UsageRecord {
    pub kind: UsageKind,
    pub name: String,
    pub uid: Uid,
    pub reserved: bool,
    /// Include file the usage occurs in, if any.
    pub include: Option<String>,
}

/// One entry of the main sequence.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum SequenceEvent {
    ScopeStart { scope: ScopeId, kind: ScopeKind },
    ScopeEnd { scope: ScopeId },
    Declaration(DeclRecord),
    Usage(UsageRecord),
    IncludeStart { name: String },
    IncludeEnd { name: String },
    Extension { name: String, behavior: ExtensionBehavior },
    SectionStart,
    SectionEnd,
}

/// The ordered event list for one file.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct MainSequence {
    events: Vec<SequenceEvent>,
}

impl MainSequence {
    pub fn new(events: Vec<SequenceEvent>) -> Self {
        MainSequence { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&SequenceEvent> {
        self.events.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequenceEvent> {
        self.events.iter()
    }

    /// Enumerated iteration, the common traversal shape for passes.
    pub fn enumerated(&self) -> impl Iterator<Item = (usize, &SequenceEvent)> {
        self.events.iter().enumerate()
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<SequenceEvent> {
        &mut self.events
    }

    /// `[start, end]` positions of a scope's boundary events.
    pub fn scope_range(&self, scope: ScopeId) -> Option<(usize, usize)> {
        let start = self
            .events
            .iter()
            .position(|e| matches!(e, SequenceEvent::ScopeStart { scope: s, .. } if *s == scope))?;
        let end = self
            .events
            .iter()
            .position(|e| matches!(e, SequenceEvent::ScopeEnd { scope: s } if *s == scope))?;
        Some((start, end))
    }

    /// The declaration record at `pos`, if that slot is a declaration.
    pub fn declaration(&self, pos: usize) -> Option<&DeclRecord> {
        match self.events.get(pos) {
            Some(SequenceEvent::Declaration(decl)) => Some(decl),
            _ => None,
        }
    }

    /// The usage record at `pos`, if that slot is a usage.
    pub fn usage(&self, pos: usize) -> Option<&UsageRecord> {
        match self.events.get(pos) {
            Some(SequenceEvent::Usage(usage)) => Some(usage),
            _ => None,
        }
    }

    /// Position of the usage event carrying `uid`.
    pub fn usage_position(&self, uid: Uid) -> Option<usize> {
        self.events.iter().position(
            |e| matches!(e, SequenceEvent::Usage(u) if u.uid == uid),
        )
    }

    /// The scope chain active just before `pos`: module scope plus every
    /// scope opened and not yet closed.
    pub fn scope_chain_at(&self, pos: usize) -> Vec<ScopeId> {
        let mut chain = vec![ScopeId::MODULE];
        for event in &self.events[..pos.min(self.events.len())] {
            match event {
                SequenceEvent::ScopeStart { scope, .. } => chain.push(*scope),
                SequenceEvent::ScopeEnd { .. } => {
                    chain.pop();
                }
                _ => {}
            }
        }
        chain
    }
}

impl std::ops::Index<usize> for MainSequence {
    type Output = SequenceEvent;

    fn index(&self, pos: usize) -> &SequenceEvent {
        &self.events[pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scope_chain_tracks_nesting() {
        let seq = MainSequence::new(vec![
            SequenceEvent::ScopeStart {
                scope: ScopeId(1),
                kind: ScopeKind::Function,
            },
            SequenceEvent::ScopeStart {
                scope: ScopeId(2),
                kind: ScopeKind::Block,
            },
            SequenceEvent::ScopeEnd { scope: ScopeId(2) },
        ]);
        assert_eq!(seq.scope_chain_at(0), vec![ScopeId::MODULE]);
        assert_eq!(seq.scope_chain_at(2), vec![ScopeId::MODULE, ScopeId(1), ScopeId(2)]);
        assert_eq!(seq.scope_chain_at(3), vec![ScopeId::MODULE, ScopeId(1)]);
    }

    #[test]
    fn scope_range_finds_boundaries() {
        let seq = MainSequence::new(vec![
            SequenceEvent::ScopeStart {
                scope: ScopeId(1),
                kind: ScopeKind::Struct,
            },
            SequenceEvent::ScopeEnd { scope: ScopeId(1) },
        ]);
        assert_eq!(seq.scope_range(ScopeId(1)), Some((0, 1)));
        assert_eq!(seq.scope_range(ScopeId(9)), None);
    }
}
