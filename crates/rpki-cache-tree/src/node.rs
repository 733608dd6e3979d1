//! In-memory hierarchy of `CacheNode`, one per path segment, held in
//! an arena addressed by integer handles so the parent/child graph
//! does not need back-reference ownership tricks.

use std::collections::HashMap;

use bitflags::bitflags;
use chrono::{DateTime, Utc};

use rpki_cache_core::CacheError;

use crate::path_builder::PathBuilder;

bitflags! {
    /// Per-node lifecycle flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// This node was itself the target of a fetch.
        const DIRECT = 0b0001;
        /// The last direct attempt succeeded.
        const SUCCESS = 0b0010;
        /// Transient: set while a sweep has visited this node.
        const FOUND = 0b0100;
        /// HTTP-only: this node designates a leaf file, not a directory.
        const FILE = 0b1000;
    }
}

/// Arena handle for a `CacheNode`. Stable for the lifetime of the
/// owning `NodeTree`; reused slots are not recycled (the tree lives
/// for one process run, so churn is bounded by publication-point
/// churn, not by handle exhaustion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone)]
pub struct CacheNode {
    pub basename: String,
    pub flags: NodeFlags,
    pub ts_success: Option<DateTime<Utc>>,
    pub ts_attempt: Option<DateTime<Utc>>,
    pub error: i32,
    pub parent: Option<NodeId>,
    pub children: HashMap<String, NodeId>,
}

impl CacheNode {
    fn new(basename: String, parent: Option<NodeId>) -> Self {
        CacheNode {
            basename,
            flags: NodeFlags::empty(),
            ts_success: None,
            ts_attempt: None,
            error: 0,
            parent,
            children: HashMap::new(),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.flags.contains(NodeFlags::DIRECT)
    }

    pub fn is_success(&self) -> bool {
        self.flags.contains(NodeFlags::SUCCESS)
    }

    pub fn is_file(&self) -> bool {
        self.flags.contains(NodeFlags::FILE)
    }

    /// Fresh iff directly fetched at or after `startup_time`.
    pub fn is_fresh(&self, startup_time: DateTime<Utc>) -> bool {
        self.is_direct() && self.ts_attempt.map(|ts| startup_time <= ts).unwrap_or(false)
    }
}

/// Arena-backed hierarchy rooted at one or more top-level nodes.
///
/// A slot is `None` once freed; `delete_node` never compacts the
/// vector, so existing `NodeId`s elsewhere in the tree stay valid.
#[derive(Debug, Default)]
pub struct NodeTree {
    slots: Vec<Option<CacheNode>>,
}

impl NodeTree {
    pub fn new() -> Self {
        NodeTree::default()
    }

    /// Create a root node with no parent. Roots are never subject to
    /// `delete_node(force=false)`.
    pub fn init_root(&mut self, label: &str) -> NodeId {
        self.insert(CacheNode::new(label.to_string(), None))
    }

    fn insert(&mut self, node: CacheNode) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(node));
        id
    }

    pub fn node(&self, id: NodeId) -> &CacheNode {
        self.slots[id.0 as usize].as_ref().expect("dangling NodeId")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CacheNode {
        self.slots[id.0 as usize].as_mut().expect("dangling NodeId")
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    pub fn child(&self, parent: NodeId, basename: &str) -> Option<NodeId> {
        self.node(parent).children.get(basename).copied()
    }

    /// Idempotent: returns the existing child if `basename` is
    /// already present, otherwise creates and links a new one.
    pub fn add_child(&mut self, parent: NodeId, basename: &str) -> NodeId {
        if let Some(existing) = self.child(parent, basename) {
            return existing;
        }
        let child = self.insert(CacheNode::new(basename.to_string(), Some(parent)));
        self.node_mut(parent).children.insert(basename.to_string(), child);
        child
    }

    /// Recursively free `node`'s descendants, leaving `node` itself
    /// intact with an empty `children` map. Iterative: an explicit
    /// stack stands in for the original's recursive `drop_children`.
    pub fn drop_children(&mut self, node: NodeId) {
        let mut stack: Vec<NodeId> = self.node(node).children.values().copied().collect();
        self.node_mut(node).children.clear();
        while let Some(id) = stack.pop() {
            stack.extend(self.node(id).children.values().copied());
            self.slots[id.0 as usize] = None;
        }
    }

    /// Remove `node` from its parent's children map and free its
    /// subtree. Refuses to remove a root unless `force` is set.
    pub fn delete_node(&mut self, node: NodeId, force: bool) -> bool {
        if !force && self.is_root(node) {
            return false;
        }
        if let Some(parent) = self.node(node).parent {
            let basename = self.node(node).basename.clone();
            self.node_mut(parent).children.remove(&basename);
        }
        self.drop_children(node);
        self.slots[node.0 as usize] = None;
        true
    }

    /// Segments from root to `node`, inclusive, built by walking
    /// `parent` pointers and reversing via the path builder. Fails if
    /// the accumulated path exceeds the path builder's bound.
    pub fn path_of(&self, node: NodeId) -> Result<Vec<String>, CacheError> {
        let mut builder = PathBuilder::new();
        let mut cur = Some(node);
        while let Some(id) = cur {
            builder.append(&self.node(id).basename)?;
            cur = self.node(id).parent;
        }
        builder.reverse();
        Ok(builder.peek().split(std::path::MAIN_SEPARATOR).map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_is_idempotent_by_basename() {
        let mut tree = NodeTree::new();
        let root = tree.init_root("https");
        let a1 = tree.add_child(root, "example.org");
        let a2 = tree.add_child(root, "example.org");
        assert_eq!(a1, a2);
        assert_eq!(tree.node(root).children.len(), 1);
    }

    #[test]
    fn delete_node_refuses_root_without_force() {
        let mut tree = NodeTree::new();
        let root = tree.init_root("rsync");
        assert!(!tree.delete_node(root, false));
        assert!(tree.delete_node(root, true));
    }

    #[test]
    fn delete_node_removes_from_parent_children() {
        let mut tree = NodeTree::new();
        let root = tree.init_root("https");
        let child = tree.add_child(root, "a");
        tree.delete_node(child, false);
        assert!(tree.child(root, "a").is_none());
    }

    #[test]
    fn drop_children_frees_whole_subtree_but_keeps_node() {
        let mut tree = NodeTree::new();
        let root = tree.init_root("https");
        let a = tree.add_child(root, "a");
        let _b = tree.add_child(a, "b");
        tree.drop_children(a);
        assert!(tree.node(a).children.is_empty());
    }

    #[test]
    fn path_of_walks_root_to_node() {
        let mut tree = NodeTree::new();
        let root = tree.init_root("https");
        let a = tree.add_child(root, "example.org");
        let b = tree.add_child(a, "x.cer");
        assert_eq!(tree.path_of(b).unwrap(), vec!["https", "example.org", "x.cer"]);
    }

    #[test]
    fn path_of_reports_path_too_long() {
        let mut tree = NodeTree::new();
        let root = tree.init_root("https");
        let long_segment = "a".repeat(crate::path_builder::MAX_PATH_LEN + 1);
        let child = tree.add_child(root, &long_segment);
        assert!(matches!(tree.path_of(child), Err(CacheError::PathTooLong { .. })));
    }

    #[test]
    fn success_without_direct_is_representable_but_not_produced_by_the_coordinator() {
        // The flags type itself does not forbid SUCCESS without DIRECT;
        // `rpki_cache`'s download coordinator is what upholds SUCCESS => DIRECT.
        let mut flags = NodeFlags::empty();
        flags.insert(NodeFlags::SUCCESS);
        assert!(flags.contains(NodeFlags::SUCCESS));
        assert!(!flags.contains(NodeFlags::DIRECT));
    }
}
