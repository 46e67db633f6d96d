//! Brace elision marking.
//!
//! A block whose body is a single statement can be emitted without braces
//! when nothing in it declares a name. The mark is advisory: the translator
//! consults `brace_eliminable` and keeps braces everywhere else. Text-level
//! mutation only, the tree's structure and epoch are untouched.

use gls_ast::{NodeId, NodeKind, SyntaxTree};

/// Mark every block whose braces may be omitted. Returns the mark count.
pub fn mark_eliminable_braces(tree: &mut SyntaxTree) -> usize {
    let root = tree.root();
    let mut marked = 0;
    mark(tree, root, None, &mut marked);
    marked
}

fn mark(tree: &mut SyntaxTree, id: NodeId, parent: Option<NodeKind>, marked: &mut usize) {
    let kind = tree.node(id).kind;
    let children = tree.node(id).children.clone();

    // Function bodies keep their braces; only statement-position blocks
    // under a control construct (or a redundant bare nesting) qualify.
    let elidable_position = matches!(
        parent,
        Some(NodeKind::If | NodeKind::For | NodeKind::While | NodeKind::Block)
    );
    if kind == NodeKind::Block && elidable_position && children.len() == 1 {
        let child = tree.node(children[0]);
        if child.kind != NodeKind::DeclarationList && child.kind.is_statement() {
            tree.node_mut(id).brace_eliminable = true;
            *marked += 1;
        }
    }

    for child in children {
        mark(tree, child, Some(kind), marked);
    }
}
