//! Convenience constructors for assembling trees.
//!
//! The parser that normally produces trees is an external program; these
//! helpers give host code and tests a compact way to assemble well-formed
//! nodes without hand-writing every field.

use crate::node::{NodeId, NodeKind, Qualifier, SyntaxNode};
use crate::tree::SyntaxTree;

fn alloc(tree: &mut SyntaxTree, mut node: SyntaxNode, children: Vec<NodeId>) -> NodeId {
    node.children = children;
    tree.alloc(node)
}

/// Identifier reference.
pub fn ident(tree: &mut SyntaxTree, name: &str) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Ident);
    node.text = Some(name.into());
    tree.alloc(node)
}

/// Literal token.
pub fn literal(tree: &mut SyntaxTree, text: &str) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Literal);
    node.text = Some(text.into());
    tree.alloc(node)
}

/// Function or constructor call.
pub fn call(tree: &mut SyntaxTree, callee: &str, args: Vec<NodeId>) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Call);
    node.text = Some(callee.into());
    alloc(tree, node, args)
}

/// Field selection `receiver.name`.
pub fn field(tree: &mut SyntaxTree, receiver: NodeId, name: &str) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::FieldSelect);
    node.text = Some(name.into());
    alloc(tree, node, vec![receiver])
}

/// Binary expression.
pub fn binary(tree: &mut SyntaxTree, op: &str, lhs: NodeId, rhs: NodeId) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Binary);
    node.text = Some(op.into());
    alloc(tree, node, vec![lhs, rhs])
}

/// Assignment expression.
pub fn assign(tree: &mut SyntaxTree, op: &str, target: NodeId, value: NodeId) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Assign);
    node.text = Some(op.into());
    alloc(tree, node, vec![target, value])
}

/// Expression statement.
pub fn expr_stmt(tree: &mut SyntaxTree, expr: NodeId) -> NodeId {
    alloc(tree, SyntaxNode::new(NodeKind::ExprStatement), vec![expr])
}

/// `return` statement, with optional value.
pub fn ret(tree: &mut SyntaxTree, value: Option<NodeId>) -> NodeId {
    alloc(
        tree,
        SyntaxNode::new(NodeKind::Return),
        value.into_iter().collect(),
    )
}

/// One declared name, with optional initializer.
pub fn declarator(tree: &mut SyntaxTree, name: &str, init: Option<NodeId>) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Declarator);
    node.text = Some(name.into());
    alloc(tree, node, init.into_iter().collect())
}

/// Declaration statement over one or more declarators.
pub fn decl(
    tree: &mut SyntaxTree,
    qualifier: Qualifier,
    type_name: &str,
    declarators: Vec<NodeId>,
) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::DeclarationList);
    node.type_name = Some(type_name.into());
    node.qualifier = qualifier;
    alloc(tree, node, declarators)
}

/// Unqualified single-name declaration, the common case.
pub fn var(tree: &mut SyntaxTree, type_name: &str, name: &str, init: Option<NodeId>) -> NodeId {
    let d = declarator(tree, name, init);
    decl(tree, Qualifier::None, type_name, vec![d])
}

/// Statement block.
pub fn block(tree: &mut SyntaxTree, stmts: Vec<NodeId>) -> NodeId {
    alloc(tree, SyntaxNode::new(NodeKind::Block), stmts)
}

/// Function parameter.
pub fn param(tree: &mut SyntaxTree, type_name: &str, name: &str) -> NodeId {
    let mut node = SyntaxNode::new(NodeKind::Param);
    node.text = Some(name.into());
    node.type_name = Some(type_name.into());
    tree.alloc(node)
}

/// Function definition; the body block is created around `body_stmts`.
pub fn function(
    tree: &mut SyntaxTree,
    return_type: &str,
    name: &str,
    params: Vec<NodeId>,
    body_stmts: Vec<NodeId>,
) -> NodeId {
    let body = block(tree, body_stmts);
    let mut node = SyntaxNode::new(NodeKind::FunctionDef);
    node.text = Some(name.into());
    node.type_name = Some(return_type.into());
    let mut children = params;
    children.push(body);
    alloc(tree, node, children)
}

/// Struct type definition from `(type, name)` member pairs.
pub fn struct_def(tree: &mut SyntaxTree, name: &str, members: &[(&str, &str)]) -> NodeId {
    let fields = members
        .iter()
        .map(|(ty, field_name)| {
            let mut node = SyntaxNode::new(NodeKind::StructField);
            node.text = Some((*field_name).into());
            node.type_name = Some((*ty).into());
            tree.alloc(node)
        })
        .collect();
    let mut node = SyntaxNode::new(NodeKind::StructDef);
    node.text = Some(name.into());
    alloc(tree, node, fields)
}

/// `if` statement with optional else branch.
pub fn if_stmt(
    tree: &mut SyntaxTree,
    cond: NodeId,
    then_branch: NodeId,
    else_branch: Option<NodeId>,
) -> NodeId {
    let mut children = vec![cond, then_branch];
    children.extend(else_branch);
    alloc(tree, SyntaxNode::new(NodeKind::If), children)
}

/// `for` statement: init, condition, increment, body.
pub fn for_stmt(
    tree: &mut SyntaxTree,
    init: NodeId,
    cond: NodeId,
    step: NodeId,
    body: NodeId,
) -> NodeId {
    alloc(
        tree,
        SyntaxNode::new(NodeKind::For),
        vec![init, cond, step, body],
    )
}

/// Attach a leading marker comment to an already-built node.
pub fn with_comment(tree: &mut SyntaxTree, id: NodeId, comment: &str) -> NodeId {
    tree.node_mut(id).comments.push(comment.into());
    id
}
