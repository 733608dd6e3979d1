//! Bidirectional mapping between the node tree and the JSON array
//! persisted as `metadata.json`.
//!
//! Deserialization is defensive: a malformed node (bad timestamp,
//! wrong flag encoding) is dropped along with its subtree, logged as
//! a warning, and never aborts the rest of the load — the whole file
//! is advisory. The wire format is kept as a distinct `WireNode`
//! struct rather than deriving `Serialize`/`Deserialize` on the
//! arena-backed tree directly, so this skip-and-warn policy is
//! expressed as ordinary `Result`-returning conversions instead of a
//! custom `Deserialize` impl with shared mutable error state.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use rpki_cache_core::{CacheError, CacheResult};

use crate::node::{CacheNode, NodeFlags, NodeId, NodeTree};

pub const RSYNC_LABEL: &str = "rsync";
pub const HTTPS_LABEL: &str = "https";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, Serialize, Deserialize)]
struct WireNode {
    basename: String,
    flags: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts_attempt: Option<String>,
    #[serde(default)]
    error: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<WireNode>,
}

/// Round-trip inverse of `json2tt`: formats with the local timezone's
/// offset, matching `%Y-%m-%dT%H:%M:%S%z`.
pub fn tt2json(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Round-trip inverse of `tt2json`.
pub fn json2tt(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let parsed = DateTime::parse_from_str(s, TIMESTAMP_FORMAT)?;
    Ok(parsed.with_timezone(&Utc))
}

/// Attempt to build a `CacheNode`'s scalar fields (everything but
/// `children`, which the caller handles) from a `WireNode`. Returns
/// `None` — logged by the caller — on any malformed field.
fn try_node_fields(wire: &WireNode) -> Option<(NodeFlags, Option<DateTime<Utc>>, Option<DateTime<Utc>>, i32)> {
    let flags = NodeFlags::from_bits(wire.flags)?;

    if flags.contains(NodeFlags::SUCCESS) && !flags.contains(NodeFlags::DIRECT) {
        log::warn!("metadata: node {:?} has SUCCESS without DIRECT", wire.basename);
        return None;
    }

    let ts_success = match &wire.ts_success {
        Some(s) => match json2tt(s) {
            Ok(ts) => Some(ts),
            Err(_) => {
                log::warn!("metadata: node {:?} has unparseable ts_success {:?}", wire.basename, s);
                return None;
            }
        },
        None => None,
    };

    let ts_attempt = match &wire.ts_attempt {
        Some(s) => match json2tt(s) {
            Ok(ts) => Some(ts),
            Err(_) => {
                log::warn!("metadata: node {:?} has unparseable ts_attempt {:?}", wire.basename, s);
                return None;
            }
        },
        None => None,
    };

    Some((flags, ts_success, ts_attempt, wire.error))
}

/// Load `<root>/metadata.json`, synthesizing empty roots for either
/// transport that is absent or malformed. Never fails: an absent or
/// corrupt metadata file is a silent fresh start, per §7.
pub fn load(local_repository_root: &Path) -> (NodeTree, NodeId, NodeId) {
    let path = local_repository_root.join("metadata.json");
    let mut tree = NodeTree::new();

    let top_level: Vec<WireNode> = match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("metadata: {} is not valid JSON ({e}), starting fresh", path.display());
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    };

    let mut rsync_root = None;
    let mut https_root = None;

    for wire in top_level {
        let label = if wire.basename.eq_ignore_ascii_case(RSYNC_LABEL) {
            RSYNC_LABEL
        } else if wire.basename.eq_ignore_ascii_case(HTTPS_LABEL) {
            HTTPS_LABEL
        } else {
            log::warn!("metadata: dropping unrecognized top-level node {:?}", wire.basename);
            continue;
        };

        let root_id = tree.init_root(label);
        load_subtree(&mut tree, root_id, wire, label == HTTPS_LABEL);

        if label == RSYNC_LABEL {
            rsync_root = Some(root_id);
        } else {
            https_root = Some(root_id);
        }
    }

    let rsync_root = rsync_root.unwrap_or_else(|| tree.init_root(RSYNC_LABEL));
    let https_root = https_root.unwrap_or_else(|| tree.init_root(HTTPS_LABEL));

    (tree, rsync_root, https_root)
}

/// Iteratively materialize `wire`'s children under `parent` (already
/// inserted into `tree`). A malformed child is dropped along with its
/// own children without visiting them — since they are only
/// discovered by descending into the child's `children` array, never
/// descending there is equivalent to discarding the already-loaded
/// subtree.
fn load_subtree(tree: &mut NodeTree, parent: NodeId, wire: WireNode, under_https: bool) {
    // Apply the parent's own scalar fields first (the top-level wire
    // node describes the root itself, not just a container).
    apply_fields(tree, parent, &wire, under_https);

    let mut stack: Vec<(NodeId, WireNode)> = wire.children.into_iter().map(|c| (parent, c)).collect();

    while let Some((parent_id, child_wire)) = stack.pop() {
        let fields = match try_node_fields(&child_wire) {
            Some(f) => f,
            None => {
                log::warn!("metadata: dropping malformed node {:?} and its subtree", child_wire.basename);
                continue;
            }
        };

        if fields.0.contains(NodeFlags::FILE) && !under_https {
            log::warn!("metadata: dropping node {:?} with FILE set outside https root", child_wire.basename);
            continue;
        }
        if fields.1.is_some() && !fields.0.contains(NodeFlags::SUCCESS) {
            log::warn!("metadata: dropping node {:?} with ts_success but no SUCCESS flag", child_wire.basename);
            continue;
        }

        let child_id = tree.add_child(parent_id, &child_wire.basename);
        {
            let node = tree.node_mut(child_id);
            node.flags = fields.0;
            node.ts_success = fields.1;
            node.ts_attempt = fields.2;
            node.error = fields.3;
        }

        for grandchild in child_wire.children {
            stack.push((child_id, grandchild));
        }
    }
}

fn apply_fields(tree: &mut NodeTree, node_id: NodeId, wire: &WireNode, under_https: bool) {
    match try_node_fields(wire) {
        Some((flags, ts_success, ts_attempt, error)) => {
            if flags.contains(NodeFlags::FILE) && !under_https {
                log::warn!("metadata: dropping FILE flag on root-level node {:?} outside https", wire.basename);
                return;
            }
            if ts_success.is_some() && !flags.contains(NodeFlags::SUCCESS) {
                log::warn!("metadata: dropping ts_success on root-level node {:?} with no SUCCESS flag", wire.basename);
                return;
            }
            let node = tree.node_mut(node_id);
            node.flags = flags;
            node.ts_success = ts_success;
            node.ts_attempt = ts_attempt;
            node.error = error;
        }
        None => {
            log::warn!("metadata: root node {:?} has malformed fields, leaving defaults", wire.basename);
        }
    }
}

/// Serialize the surviving tree rooted at `rsync_root` and
/// `https_root` to `<local_repository_root>/metadata.json`, compact.
pub fn dump(local_repository_root: &Path, tree: &NodeTree, rsync_root: NodeId, https_root: NodeId) -> CacheResult<()> {
    let document = vec![encode_subtree(tree, rsync_root), encode_subtree(tree, https_root)];
    let serialized = serde_json::to_string(&document).map_err(|e| CacheError::Metadata(e.to_string()))?;
    fs::create_dir_all(local_repository_root)?;
    fs::write(local_repository_root.join("metadata.json"), serialized)?;
    Ok(())
}

/// Encode the subtree rooted at `root` into a single `WireNode`,
/// built bottom-up from an iterative preorder walk (see module docs
/// on why a reversed preorder is a valid postorder build order here).
fn encode_subtree(tree: &NodeTree, root: NodeId) -> WireNode {
    let mut preorder = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        preorder.push(id);
        stack.extend(tree.node(id).children.values().copied());
    }

    let mut pending_children: std::collections::HashMap<NodeId, Vec<WireNode>> = std::collections::HashMap::new();

    let mut result = None;
    for id in preorder.into_iter().rev() {
        let node = tree.node(id);
        let children = pending_children.remove(&id).unwrap_or_default();
        let wire = encode_node(node, children);

        match node.parent {
            Some(parent) => pending_children.entry(parent).or_default().push(wire),
            None => result = Some(wire),
        }
    }

    result.expect("root is always present in its own preorder walk")
}

fn encode_node(node: &CacheNode, children: Vec<WireNode>) -> WireNode {
    WireNode {
        basename: node.basename.clone(),
        flags: node.flags.bits(),
        ts_success: node.ts_success.map(tt2json),
        ts_attempt: node.ts_attempt.map(tt2json),
        error: node.error,
        children,
    }
}
