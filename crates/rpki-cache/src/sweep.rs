//! End-of-run reconciliation between the node tree and the on-disk
//! mirror: prunes nodes whose on-disk path is gone, removes on-disk
//! entries with no corresponding node, and trims now-empty
//! directories. Iterative (explicit work stack) rather than
//! recursive, per the original's `FIXME recursive` on
//! `cleanup_recursive`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};

use rpki_cache_tree::{NodeFlags, NodeId, NodeTree};

use crate::paths::node_fs_path;

/// Sweep the subtree rooted at `root`. Best-effort: stat/read_dir/remove
/// errors are logged and bypassed, never propagated.
pub fn sweep(tree: &mut NodeTree, root: NodeId, startup_time: DateTime<Utc>, local_repository_root: &Path) {
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let path = match node_fs_path(local_repository_root, tree, id) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("cleanup: computing path for node failed: {e}");
                continue;
            }
        };

        let metadata = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tree.delete_node(id, false);
                continue;
            }
            Err(e) => {
                log::warn!("cleanup: stat {} failed: {e}", path.display());
                continue;
            }
        };

        if tree.node(id).is_fresh(startup_time) && tree.node(id).error == 0 {
            // used this run; keep the subtree untouched.
            continue;
        }

        let file_type = metadata.file_type();

        if file_type.is_file() {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("cleanup: remove_file {} failed: {e}", path.display());
            }
            tree.delete_node(id, false);
            continue;
        }

        if file_type.is_dir() {
            sweep_directory(tree, id, &path, &mut stack);
            continue;
        }

        // device, symlink, socket, or anything else: treat as a leaf to remove.
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("cleanup: remove {} failed: {e}", path.display());
        }
        tree.delete_node(id, false);
    }
}

/// Reconcile one directory node: walk its on-disk entries (std's
/// `read_dir` never yields `.`/`..`, unlike C's `readdir`), mark
/// matching children `FOUND` and queue them, remove unmatched disk
/// entries, then drop any child that was not found on disk. Finally
/// remove the directory itself if it ends up empty and is not a root.
fn sweep_directory(tree: &mut NodeTree, id: NodeId, path: &Path, stack: &mut Vec<NodeId>) {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cleanup: read_dir {} failed: {e}", path.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();

        if let Some(child) = tree.child(id, &name) {
            tree.node_mut(child).flags.insert(NodeFlags::FOUND);
            stack.push(child);
            continue;
        }

        let entry_path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let result = if is_dir { fs::remove_dir_all(&entry_path) } else { fs::remove_file(&entry_path) };
        if let Err(e) = result {
            log::warn!("cleanup: remove orphan entry {} failed: {e}", entry_path.display());
        }
    }

    let children: Vec<NodeId> = tree.node(id).children.values().copied().collect();
    for child in children {
        if tree.node(child).flags.contains(NodeFlags::FOUND) {
            tree.node_mut(child).flags.remove(NodeFlags::FOUND);
        } else {
            tree.delete_node(child, false);
        }
    }

    if tree.node(id).children.is_empty() && !tree.is_root(id) {
        if let Err(e) = fs::remove_dir(path) {
            log::warn!("cleanup: remove_dir {} failed: {e}", path.display());
        }
        tree.delete_node(id, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpki_cache_tree::{HTTPS_LABEL, RSYNC_LABEL};
    use std::fs;

    fn fresh_now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn sweep_removes_orphan_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("https")).unwrap();
        fs::write(dir.path().join("https").join("stale.txt"), b"x").unwrap();

        let mut tree = NodeTree::new();
        let https_root = tree.init_root(HTTPS_LABEL);
        let startup = fresh_now();

        sweep(&mut tree, https_root, startup, dir.path());

        assert!(!dir.path().join("https").join("stale.txt").exists());
    }

    #[test]
    fn sweep_prunes_node_whose_disk_path_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("rsync")).unwrap();

        let mut tree = NodeTree::new();
        let rsync_root = tree.init_root(RSYNC_LABEL);
        let ghost = tree.add_child(rsync_root, "ghost");
        let startup = fresh_now();

        sweep(&mut tree, rsync_root, startup, dir.path());

        assert!(tree.child(rsync_root, "ghost").is_none());
        let _ = ghost;
    }

    #[test]
    fn sweep_keeps_fresh_successful_subtree_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("https").join("example.org")).unwrap();
        fs::write(dir.path().join("https").join("example.org").join("a.cer"), b"x").unwrap();

        let mut tree = NodeTree::new();
        let https_root = tree.init_root(HTTPS_LABEL);
        let a = tree.add_child(https_root, "example.org");
        let cer = tree.add_child(a, "a.cer");
        let startup = fresh_now();
        {
            let node = tree.node_mut(cer);
            node.flags.insert(NodeFlags::DIRECT);
            node.flags.insert(NodeFlags::SUCCESS);
            node.flags.insert(NodeFlags::FILE);
            node.ts_attempt = Some(startup);
            node.ts_success = Some(startup);
            node.error = 0;
        }

        sweep(&mut tree, https_root, startup, dir.path());

        assert!(dir.path().join("https").join("example.org").join("a.cer").exists());
        assert!(tree.child(a, "a.cer").is_some());
    }

    #[test]
    fn sweep_removes_now_empty_directory_and_its_node() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("https").join("empty")).unwrap();

        let mut tree = NodeTree::new();
        let https_root = tree.init_root(HTTPS_LABEL);
        let empty = tree.add_child(https_root, "empty");
        let startup = fresh_now();

        sweep(&mut tree, https_root, startup, dir.path());

        assert!(!dir.path().join("https").join("empty").exists());
        assert!(tree.child(https_root, "empty").is_none());
        let _ = empty;
    }
}
