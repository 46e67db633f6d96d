//! Single-walk sequence collection.
//!
//! One depth-first traversal reduces the tree to the main sequence: scope
//! boundaries, declarations, usages, and the region events decoded from
//! leading marker comments. Two post-processing steps run before the
//! sequence is handed out: dangling includes are closed, and struct member
//! declarations are folded into their struct's record so the flat scope
//! search never sees field names reachable only through a value.

use rustc_hash::FxHashSet;
use tracing::debug;

use gls_ast::{
    reserved, Marker, NodeId, NodeIndex, NodeKind, Qualifier, SyntaxTree, UnitMetadata, Visitor,
};

use crate::event::{
    DeclKind, DeclRecord, MainSequence, ScopeId, ScopeKind, SequenceEvent, UsageKind, UsageRecord,
};
use crate::CollectError;

/// Collect the main sequence for one file.
///
/// The index must be current for the tree: every emitted event carries the
/// node's uid as its back-reference, and stale uids would poison every later
/// pass.
pub fn collect(
    tree: &SyntaxTree,
    index: &NodeIndex,
    metadata: &UnitMetadata,
) -> Result<MainSequence, CollectError> {
    if !index.is_current(tree) {
        return Err(CollectError::StaleIndex);
    }

    let mut collector = Collector {
        metadata,
        events: Vec::new(),
        open_scopes: Vec::new(),
        scope_counter: 0,
        include_stack: Vec::new(),
        decl_ctx: Vec::new(),
        parent_kinds: Vec::new(),
        body_blocks: FxHashSet::default(),
        error: None,
    };
    gls_ast::walk(tree, tree.root(), &mut collector);

    if let Some(error) = collector.error {
        return Err(error);
    }

    // Close dangling includes: malformed nesting must not leak an open
    // region into the next pass.
    while let Some(name) = collector.include_stack.pop() {
        debug!(include = %name, "closing dangling include");
        collector.events.push(SequenceEvent::IncludeEnd { name });
    }

    let mut seq = MainSequence::new(collector.events);
    fold_struct_fields(&mut seq);
    debug!(events = seq.len(), "collected main sequence");
    Ok(seq)
}

struct DeclCtx {
    type_name: String,
    qualifier: Qualifier,
    loop_init: bool,
}

struct Collector<'a> {
    metadata: &'a UnitMetadata,
    events: Vec<SequenceEvent>,
    /// Scopes opened by nodes still on the walk stack: (opener, scope id).
    open_scopes: Vec<(NodeId, ScopeId)>,
    scope_counter: u32,
    include_stack: Vec<String>,
    decl_ctx: Vec<DeclCtx>,
    parent_kinds: Vec<NodeKind>,
    /// Body blocks of function definitions; they continue the function scope
    /// instead of opening their own.
    body_blocks: FxHashSet<NodeId>,
    error: Option<CollectError>,
}

impl Collector<'_> {
    fn current_scope(&self) -> ScopeId {
        self.open_scopes
            .last()
            .map_or(ScopeId::MODULE, |&(_, scope)| scope)
    }

    fn open_scope(&mut self, opener: NodeId, kind: ScopeKind) {
        self.scope_counter += 1;
        let scope = ScopeId(self.scope_counter);
        self.open_scopes.push((opener, scope));
        self.events.push(SequenceEvent::ScopeStart { scope, kind });
    }

    fn decode_markers(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<(), CollectError> {
        for comment in &tree.node(id).comments {
            let Some(marker) = Marker::parse(comment)? else {
                continue;
            };
            match marker {
                Marker::IncludeBegin(name) => {
                    self.include_stack.push(name.clone());
                    self.events.push(SequenceEvent::IncludeStart { name });
                }
                Marker::IncludeEnd(name) => {
                    // Pop down to the matching entry; unknown names close
                    // nothing rather than unbalancing the stack.
                    if let Some(at) = self.include_stack.iter().rposition(|n| *n == name) {
                        self.include_stack.truncate(at);
                    }
                    self.events.push(SequenceEvent::IncludeEnd { name });
                }
                Marker::Extension { name, behavior } => {
                    self.events.push(SequenceEvent::Extension { name, behavior });
                }
                Marker::SectionBegin => self.events.push(SequenceEvent::SectionStart),
                Marker::SectionEnd => self.events.push(SequenceEvent::SectionEnd),
                // Translator-owned markers carry no sequence semantics.
                Marker::Protect(_) | Marker::RemoveBegin | Marker::RemoveEnd => {}
            }
        }
        Ok(())
    }

    fn pinned(&self, name: &str) -> bool {
        reserved::PINNED.contains(&name)
            || self.metadata.reserved_idents.iter().any(|r| r == name)
    }

    fn make_decl(
        &self,
        tree: &SyntaxTree,
        id: NodeId,
        kind: DeclKind,
        name: &str,
        type_name: &str,
        qualifier: Qualifier,
        scope: ScopeId,
    ) -> Result<DeclRecord, CollectError> {
        let node = tree.node(id);
        let uid = node.uid.ok_or(CollectError::MissingUid { kind: node.kind })?;
        let is_reserved = reserved::is_reserved(name);
        if is_reserved && !(name == reserved::ENTRY_POINT && kind.is_function()) {
            return Err(CollectError::ReservedDeclaration { name: name.into() });
        }
        let obfuscation_allowed = !is_reserved
            && !matches!(qualifier, Qualifier::Uniform | Qualifier::Attribute)
            && !self.pinned(name);
        Ok(DeclRecord {
            kind,
            name: name.into(),
            uid,
            type_name: type_name.into(),
            qualifier,
            scope,
            include: self.include_stack.last().cloned(),
            reserved: is_reserved,
            obfuscation_allowed,
            loop_init: false,
            array: node.array_size.is_some(),
            protected: node.protected,
            fields: Vec::new(),
        })
    }

    fn push_usage(&mut self, tree: &SyntaxTree, id: NodeId, kind: UsageKind, name: &str) {
        let Some(uid) = tree.node(id).uid else {
            self.error = Some(CollectError::MissingUid {
                kind: tree.node(id).kind,
            });
            return;
        };
        self.events.push(SequenceEvent::Usage(UsageRecord {
            kind,
            name: name.into(),
            uid,
            reserved: reserved::is_reserved(name),
            include: self.include_stack.last().cloned(),
        }));
    }

    /// A type name that refers to a user-defined struct rather than a
    /// builtin type.
    fn push_type_usage(&mut self, tree: &SyntaxTree, id: NodeId, type_name: &str) {
        if !type_name.is_empty() && !reserved::is_reserved(type_name) {
            self.push_usage(tree, id, UsageKind::StructTypeRef, type_name);
        }
    }

    fn handle_enter(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<bool, CollectError> {
        self.decode_markers(tree, id)?;
        let node = tree.node(id);
        match node.kind {
            NodeKind::FunctionDef | NodeKind::FunctionProto => {
                let kind = if node.kind == NodeKind::FunctionDef {
                    DeclKind::FunctionDef
                } else {
                    DeclKind::FunctionProto
                };
                let decl = self.make_decl(
                    tree,
                    id,
                    kind,
                    node.text(),
                    node.type_name(),
                    Qualifier::None,
                    self.current_scope(),
                )?;
                self.events.push(SequenceEvent::Declaration(decl));
                self.push_type_usage(tree, id, node.type_name());
                if node.kind == NodeKind::FunctionDef {
                    // Parameters and the body share one function scope; the
                    // body block must not open a second one.
                    if let Some(&body) = node.children.last() {
                        if tree.node(body).kind == NodeKind::Block {
                            self.body_blocks.insert(body);
                        }
                    }
                    self.open_scope(id, ScopeKind::Function);
                }
            }
            NodeKind::Param => {
                let decl = self.make_decl(
                    tree,
                    id,
                    DeclKind::Param,
                    node.text(),
                    node.type_name(),
                    node.qualifier,
                    self.current_scope(),
                )?;
                self.events.push(SequenceEvent::Declaration(decl));
                self.push_type_usage(tree, id, node.type_name());
            }
            NodeKind::DeclarationList => {
                self.decl_ctx.push(DeclCtx {
                    type_name: node.type_name().to_owned(),
                    qualifier: node.qualifier,
                    loop_init: self.parent_kinds.last() == Some(&NodeKind::For),
                });
                self.push_type_usage(tree, id, node.type_name());
            }
            NodeKind::Declarator => {
                let (type_name, qualifier, loop_init) = match self.decl_ctx.last() {
                    Some(ctx) => (ctx.type_name.clone(), ctx.qualifier, ctx.loop_init),
                    None => (String::new(), Qualifier::None, false),
                };
                let mut decl = self.make_decl(
                    tree,
                    id,
                    DeclKind::Variable,
                    node.text(),
                    &type_name,
                    qualifier,
                    self.current_scope(),
                )?;
                decl.loop_init = loop_init;
                self.events.push(SequenceEvent::Declaration(decl));
            }
            NodeKind::StructDef => {
                let decl = self.make_decl(
                    tree,
                    id,
                    DeclKind::StructType,
                    node.text(),
                    node.text(),
                    Qualifier::None,
                    self.current_scope(),
                )?;
                self.events.push(SequenceEvent::Declaration(decl));
                self.open_scope(id, ScopeKind::Struct);
            }
            NodeKind::StructField => {
                let decl = self.make_decl(
                    tree,
                    id,
                    DeclKind::StructField,
                    node.text(),
                    node.type_name(),
                    Qualifier::None,
                    self.current_scope(),
                )?;
                self.events.push(SequenceEvent::Declaration(decl));
                self.push_type_usage(tree, id, node.type_name());
            }
            NodeKind::Block => {
                if !self.body_blocks.contains(&id) {
                    self.open_scope(id, ScopeKind::Block);
                }
            }
            NodeKind::For => {
                self.open_scope(id, ScopeKind::Loop);
            }
            NodeKind::Ident => self.push_usage(tree, id, UsageKind::Variable, node.text()),
            NodeKind::Call => self.push_usage(tree, id, UsageKind::FunctionCall, node.text()),
            NodeKind::FieldSelect => {
                self.push_usage(tree, id, UsageKind::FieldAccess, node.text());
            }
            NodeKind::TypeRef => {
                self.push_usage(tree, id, UsageKind::StructTypeRef, node.text());
            }
            NodeKind::InvariantDecl => {
                self.push_usage(tree, id, UsageKind::InvariantRedecl, node.text());
            }
            NodeKind::Root
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Return
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Discard
            | NodeKind::ExprStatement
            | NodeKind::Assign
            | NodeKind::Binary
            | NodeKind::Unary
            | NodeKind::Conditional
            | NodeKind::Index
            | NodeKind::Literal
            | NodeKind::PrecisionDecl
            | NodeKind::Raw => {}
        }
        self.parent_kinds.push(node.kind);
        Ok(true)
    }
}

impl Visitor for Collector<'_> {
    fn enter(&mut self, tree: &SyntaxTree, id: NodeId) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.handle_enter(tree, id) {
            Ok(descend) => descend,
            Err(error) => {
                self.error = Some(error);
                false
            }
        }
    }

    fn leave(&mut self, tree: &SyntaxTree, id: NodeId) {
        if self.error.is_some() {
            return;
        }
        self.parent_kinds.pop();
        if tree.node(id).kind == NodeKind::DeclarationList {
            self.decl_ctx.pop();
        }
        if let Some(&(opener, scope)) = self.open_scopes.last() {
            if opener == id {
                self.open_scopes.pop();
                self.events.push(SequenceEvent::ScopeEnd { scope });
            }
        }
    }
}

/// Fold struct member declarations into their struct's record.
///
/// For every struct-type declaration, the events inside its scope's open
/// range move into the record's `fields` list and their slots are deleted.
/// The boundary events stay so scope chains remain balanced.
fn fold_struct_fields(seq: &mut MainSequence) {
    let mut pos = 0;
    while pos < seq.len() {
        let struct_scope = match (&seq[pos], seq.get(pos + 1)) {
            (
                SequenceEvent::Declaration(decl),
                Some(SequenceEvent::ScopeStart { scope, kind: ScopeKind::Struct }),
            ) if decl.kind == DeclKind::StructType => *scope,
            _ => {
                pos += 1;
                continue;
            }
        };
        let Some((start, end)) = seq.scope_range(struct_scope) else {
            pos += 1;
            continue;
        };
        let inner: Vec<SequenceEvent> = seq.events_mut().drain(start + 1..end).collect();
        let fields = inner
            .into_iter()
            .filter_map(|event| match event {
                SequenceEvent::Declaration(field) => Some(field),
                _ => None,
            })
            .collect();
        if let Some(SequenceEvent::Declaration(decl)) = seq.events_mut().get_mut(pos) {
            decl.fields = fields;
        }
        pos += 1;
    }
}
