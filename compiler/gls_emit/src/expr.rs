//! Expression printing.
//!
//! Expressions are rendered to strings bottom-up. Compound operands are
//! parenthesized so the regenerated text never re-associates an operator
//! tree, whatever the original source spelled out.

use gls_ast::{NodeId, NodeKind, SyntaxTree};

/// Render one expression subtree.
pub fn expr(tree: &SyntaxTree, id: NodeId) -> String {
    let node = tree.node(id);
    let children = &node.children;
    match node.kind {
        NodeKind::Ident | NodeKind::Literal | NodeKind::TypeRef | NodeKind::Raw => {
            node.text().to_owned()
        }
        NodeKind::Call => {
            let args: Vec<String> = children.iter().map(|&c| expr(tree, c)).collect();
            format!("{}({})", node.text(), args.join(", "))
        }
        NodeKind::FieldSelect => match children.first() {
            Some(&receiver) => format!("{}.{}", operand(tree, receiver), node.text()),
            None => node.text().to_owned(),
        },
        NodeKind::Index => match (children.first(), children.get(1)) {
            (Some(&receiver), Some(&subscript)) => {
                format!("{}[{}]", operand(tree, receiver), expr(tree, subscript))
            }
            _ => String::new(),
        },
        NodeKind::Binary => match (children.first(), children.get(1)) {
            (Some(&lhs), Some(&rhs)) => format!(
                "{} {} {}",
                operand(tree, lhs),
                node.text(),
                operand(tree, rhs)
            ),
            _ => String::new(),
        },
        NodeKind::Unary => match children.first() {
            Some(&inner) => format!("{}{}", node.text(), operand(tree, inner)),
            None => node.text().to_owned(),
        },
        NodeKind::Assign => match (children.first(), children.get(1)) {
            (Some(&target), Some(&value)) => {
                format!("{} {} {}", expr(tree, target), node.text(), expr(tree, value))
            }
            _ => String::new(),
        },
        NodeKind::Conditional => match (children.first(), children.get(1), children.get(2)) {
            (Some(&cond), Some(&yes), Some(&no)) => format!(
                "{} ? {} : {}",
                operand(tree, cond),
                expr(tree, yes),
                expr(tree, no)
            ),
            _ => String::new(),
        },
        _ => node.text().to_owned(),
    }
}

/// Render a sub-operand, parenthesized when it is itself compound.
fn operand(tree: &SyntaxTree, id: NodeId) -> String {
    let rendered = expr(tree, id);
    match tree.node(id).kind {
        NodeKind::Binary | NodeKind::Conditional | NodeKind::Assign => format!("({rendered})"),
        _ => rendered,
    }
}
