use std::path::{Path, PathBuf};

use rpki_cache_core::CacheError;
use rpki_cache_tree::{NodeId, NodeTree};

/// Filesystem path a node designates: `local_repository_root` joined
/// with the root-to-node segment chain (the root's own label is the
/// transport-prefixed mirror directory, e.g. `<root>/https/...`).
/// Fails if the node's accumulated path exceeds the path builder's
/// bound.
pub fn node_fs_path(local_repository_root: &Path, tree: &NodeTree, node: NodeId) -> Result<PathBuf, CacheError> {
    let mut path = local_repository_root.to_path_buf();
    for segment in tree.path_of(node)? {
        path.push(segment);
    }
    Ok(path)
}
