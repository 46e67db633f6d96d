//! Generic pre/post-order tree traversal.
//!
//! Every later pass is built on this walker: the collector, the optimizer's
//! rewrites and the translator all traverse through it or through the
//! `walk_*` helpers. The walker carries no state of its own; visitors mutate
//! their own state while the tree stays immutable.

use crate::node::NodeId;
use crate::tree::SyntaxTree;

/// Tree visitor with pre- and post-order hooks.
///
/// `enter` runs before a node's children are descended, `leave` after.
/// Returning `false` from `enter` skips the node's subtree (its `leave` still
/// runs, keeping enter/leave balanced for scope bookkeeping).
pub trait Visitor {
    fn enter(&mut self, tree: &SyntaxTree, id: NodeId) -> bool {
        let _ = (tree, id);
        true
    }

    fn leave(&mut self, tree: &SyntaxTree, id: NodeId) {
        let _ = (tree, id);
    }
}

/// Depth-first walk of the subtree rooted at `id`.
pub fn walk<V: Visitor + ?Sized>(tree: &SyntaxTree, id: NodeId, visitor: &mut V) {
    if visitor.enter(tree, id) {
        // Children are cloned out so the visitor may borrow the tree freely.
        let children = tree.node(id).children.clone();
        for child in children {
            walk(tree, child, visitor);
        }
    }
    visitor.leave(tree, id);
}

/// Walk driven by plain closures, for one-off traversals.
pub fn walk_with<Pre, Post>(tree: &SyntaxTree, id: NodeId, pre: &mut Pre, post: &mut Post)
where
    Pre: FnMut(&SyntaxTree, NodeId) -> bool,
    Post: FnMut(&SyntaxTree, NodeId),
{
    struct ClosureVisitor<'a, Pre, Post> {
        pre: &'a mut Pre,
        post: &'a mut Post,
    }

    impl<Pre, Post> Visitor for ClosureVisitor<'_, Pre, Post>
    where
        Pre: FnMut(&SyntaxTree, NodeId) -> bool,
        Post: FnMut(&SyntaxTree, NodeId),
    {
        fn enter(&mut self, tree: &SyntaxTree, id: NodeId) -> bool {
            (self.pre)(tree, id)
        }

        fn leave(&mut self, tree: &SyntaxTree, id: NodeId) {
            (self.post)(tree, id);
        }
    }

    walk(tree, id, &mut ClosureVisitor { pre, post });
}
