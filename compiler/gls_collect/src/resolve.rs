//! Scope-chain symbol resolution over the main sequence.
//!
//! Ordinary usages resolve against prior declarations whose scope is on the
//! usage's chain, last match winning (an inner or later declaration masks an
//! earlier or outer one). Field accesses resolve structurally: the receiver
//! expression is reduced to a type name, and the field is looked up in that
//! struct's folded member list.

use gls_ast::{NodeId, NodeIndex, NodeKind, SyntaxTree, Uid};

use crate::event::{DeclKind, MainSequence, SequenceEvent};

/// Resolve an ordinary usage at `usage_pos` to the position of its
/// declaration event. Returns `None` for undeclared names.
pub fn resolve(seq: &MainSequence, usage_pos: usize, name: &str) -> Option<usize> {
    let chain = seq.scope_chain_at(usage_pos);
    let mut winner = None;
    for (pos, event) in seq.enumerated().take(usage_pos) {
        if let SequenceEvent::Declaration(decl) = event {
            if decl.name == name && chain.contains(&decl.scope) {
                winner = Some(pos);
            }
        }
    }
    winner
}

/// Result of a field-access resolution.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct FieldResolution {
    /// Position of the struct-type declaration event.
    pub struct_pos: usize,
    /// Index into that declaration's `fields` list.
    pub field_index: usize,
}

/// Position of the struct-type declaration named `type_name`.
pub fn find_struct(seq: &MainSequence, type_name: &str) -> Option<usize> {
    seq.enumerated().find_map(|(pos, event)| match event {
        SequenceEvent::Declaration(decl)
            if decl.kind == DeclKind::StructType && decl.name == type_name =>
        {
            Some(pos)
        }
        _ => None,
    })
}

/// Resolve the field access carrying `access_uid` to a struct member.
///
/// Walks the receiver sub-expression, reducing it to a type name (plain
/// identifiers recurse through `resolve`), then searches the struct's
/// folded fields.
pub fn resolve_field(
    tree: &SyntaxTree,
    index: &NodeIndex,
    seq: &MainSequence,
    access_uid: Uid,
    field_name: &str,
) -> Option<FieldResolution> {
    let access = index.lookup(access_uid)?;
    let receiver = *tree.node(access).children.first()?;
    let type_name = receiver_type(tree, seq, receiver)?;
    let struct_pos = find_struct(seq, &type_name)?;
    let decl = seq.declaration(struct_pos)?;
    let field_index = decl.fields.iter().position(|f| f.name == field_name)?;
    Some(FieldResolution {
        struct_pos,
        field_index,
    })
}

/// Reduce an expression node to the type name it evaluates to, as far as
/// declaration records can tell.
pub fn receiver_type(tree: &SyntaxTree, seq: &MainSequence, id: NodeId) -> Option<String> {
    let node = tree.node(id);
    match node.kind {
        NodeKind::Ident => {
            let usage_pos = seq.usage_position(node.uid?)?;
            let decl_pos = resolve(seq, usage_pos, node.text())?;
            Some(seq.declaration(decl_pos)?.type_name.clone())
        }
        NodeKind::FieldSelect => {
            let inner = *node.children.first()?;
            let inner_type = receiver_type(tree, seq, inner)?;
            let struct_pos = find_struct(seq, &inner_type)?;
            let decl = seq.declaration(struct_pos)?;
            let field = decl.fields.iter().find(|f| f.name == node.text())?;
            Some(field.type_name.clone())
        }
        // Constructor and builtin calls evaluate to the callee type name.
        NodeKind::Call => Some(node.text().to_owned()),
        // Subscripting an array does not change the declared element type.
        NodeKind::Index => receiver_type(tree, seq, *node.children.first()?),
        // Wrappers: the left operand carries the type.
        NodeKind::Assign | NodeKind::Binary => {
            receiver_type(tree, seq, *node.children.first()?)
        }
        NodeKind::Conditional => {
            receiver_type(tree, seq, *node.children.get(1)?)
        }
        _ => None,
    }
}
