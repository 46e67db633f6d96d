//! Arena-backed syntax tree with an explicit mutation epoch.
//!
//! The tree is exclusively owned by one compilation unit. Structural edits
//! (insert/replace/remove of children) bump `epoch`, which invalidates every
//! `uid`/`parent_uid` and any `NodeIndex` built earlier; callers must run
//! `NodeIndex::recompute` before the next uid-dependent pass. Text-only
//! edits (renames) leave the structure and the epoch alone.

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeKind, SyntaxNode};

/// The syntax tree for one shader file.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: NodeId,
    #[serde(default)]
    epoch: u64,
}

impl SyntaxTree {
    /// Create a tree holding a single root node.
    pub fn new(root_kind: NodeKind) -> Self {
        SyntaxTree {
            nodes: vec![SyntaxNode::new(root_kind)],
            root: NodeId(0),
            epoch: 0,
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current mutation epoch. Bumped by every structural edit.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of arena slots (including detached nodes).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    /// Mutably borrow a node.
    ///
    /// Text-level mutation only; structural edits go through the dedicated
    /// methods so the epoch stays honest.
    pub fn node_mut(&mut self, id: NodeId) -> &mut SyntaxNode {
        &mut self.nodes[id.index()]
    }

    /// Allocate a detached node and return its id.
    pub fn alloc(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Append `child` to `parent`'s child list. Structural edit.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
        self.epoch += 1;
    }

    /// Insert `child` at position `at` of `parent`'s child list. Structural edit.
    pub fn insert_child(&mut self, parent: NodeId, at: usize, child: NodeId) {
        self.nodes[parent.index()].children.insert(at, child);
        self.epoch += 1;
    }

    /// Replace the child at position `at` of `parent`. Structural edit.
    /// The displaced node stays allocated but detached.
    pub fn replace_child(&mut self, parent: NodeId, at: usize, child: NodeId) -> NodeId {
        let old = self.nodes[parent.index()].children[at];
        self.nodes[parent.index()].children[at] = child;
        self.epoch += 1;
        old
    }

    /// Remove the child at position `at` of `parent`. Structural edit.
    pub fn remove_child(&mut self, parent: NodeId, at: usize) -> NodeId {
        let old = self.nodes[parent.index()].children.remove(at);
        self.epoch += 1;
        old
    }

    /// Position of `child` within `parent`'s child list.
    pub fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.node(parent).children.iter().position(|&c| c == child)
    }

    /// Set the text of a node. Not a structural edit.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.index()].text = Some(text.into());
    }

    /// Iterate over all arena slots in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(u32::try_from(i).unwrap_or(u32::MAX)), n))
    }
}
