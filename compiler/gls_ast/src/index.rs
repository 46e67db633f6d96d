//! Uid-to-node index with ancestor queries.
//!
//! Passes never hold references into the tree across mutations; they hold
//! `Uid` back-references and go through this index. The index is only valid
//! for the epoch it was computed at; `is_current` lets uid-dependent passes
//! assert the two-phase mutation contract (edit, then recompute, then query).

use crate::node::{NodeId, NodeKind, Uid};
use crate::tree::SyntaxTree;

/// Uid lookup table for one recomputation epoch.
#[derive(Clone, Debug)]
pub struct NodeIndex {
    /// Dense uid -> arena id. `by_uid[uid.0]` is the owning node.
    by_uid: Vec<NodeId>,
    epoch: u64,
}

impl NodeIndex {
    /// Reassign uids and parent links, then build the lookup table.
    ///
    /// One post-order pass assigns dense increasing uids (every node's uid
    /// exceeds all of its descendants'), then one pre-order pass rewrites
    /// `parent_uid` from the freshly assigned ids. Must run after any
    /// structural edit before any uid-based or sequence-based pass.
    pub fn recompute(tree: &mut SyntaxTree) -> NodeIndex {
        let mut by_uid = Vec::with_capacity(tree.len());
        let root = tree.root();
        assign_post_order(tree, root, &mut by_uid);
        rewrite_parent_links(tree, root, None);
        NodeIndex {
            by_uid,
            epoch: tree.epoch(),
        }
    }

    /// Whether the index still matches the tree's epoch.
    pub fn is_current(&self, tree: &SyntaxTree) -> bool {
        self.epoch == tree.epoch()
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }

    /// Arena id of the node carrying `uid`.
    pub fn lookup(&self, uid: Uid) -> Option<NodeId> {
        self.by_uid.get(uid.0 as usize).copied()
    }

    /// Nearest ancestor of `uid` whose kind is in `kinds`, following
    /// `parent_uid` links. The node itself is not a candidate.
    pub fn nearest_ancestor(
        &self,
        tree: &SyntaxTree,
        uid: Uid,
        kinds: &[NodeKind],
    ) -> Option<NodeId> {
        let mut cursor = tree.node(self.lookup(uid)?).parent_uid;
        while let Some(parent_uid) = cursor {
            let parent = self.lookup(parent_uid)?;
            if kinds.contains(&tree.node(parent).kind) {
                return Some(parent);
            }
            cursor = tree.node(parent).parent_uid;
        }
        None
    }

    /// Like `nearest_ancestor`, but returns the child of that ancestor which
    /// itself dominates `uid` (e.g. the declarator slot a name sits in).
    pub fn nearest_ancestor_child(
        &self,
        tree: &SyntaxTree,
        uid: Uid,
        kinds: &[NodeKind],
    ) -> Option<NodeId> {
        let mut below = self.lookup(uid)?;
        let mut cursor = tree.node(below).parent_uid;
        while let Some(parent_uid) = cursor {
            let parent = self.lookup(parent_uid)?;
            if kinds.contains(&tree.node(parent).kind) {
                return Some(below);
            }
            below = parent;
            cursor = tree.node(parent).parent_uid;
        }
        None
    }
}

fn assign_post_order(tree: &mut SyntaxTree, id: NodeId, by_uid: &mut Vec<NodeId>) {
    let children = tree.node(id).children.clone();
    for child in children {
        assign_post_order(tree, child, by_uid);
    }
    let uid = Uid(u32::try_from(by_uid.len()).unwrap_or(u32::MAX));
    tree.node_mut(id).uid = Some(uid);
    by_uid.push(id);
}

fn rewrite_parent_links(tree: &mut SyntaxTree, id: NodeId, parent: Option<Uid>) {
    tree.node_mut(id).parent_uid = parent;
    let own_uid = tree.node(id).uid;
    let children = tree.node(id).children.clone();
    for child in children {
        rewrite_parent_links(tree, child, own_uid);
    }
}
