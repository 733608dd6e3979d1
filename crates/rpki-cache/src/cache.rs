//! Public entry point: bundles both transport roots and the
//! per-run `startup_time` into one `Cache` value (the original kept
//! these as global mutable state; see module docs in `lib.rs`).

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;

use rpki_cache_core::CacheConfig;
use rpki_cache_tree::{dump_metadata, load_metadata, NodeFlags, NodeId, NodeTree};

use crate::fetcher::{DownloadOutcome, Fetcher};
use crate::paths::node_fs_path;
use crate::sweep::sweep;
use crate::uri::{Transport, Uri};

pub struct Cache {
    tree: NodeTree,
    rsync_root: NodeId,
    https_root: NodeId,
    startup_time: chrono::DateTime<Utc>,
    local_repository_root: PathBuf,
}

impl Cache {
    /// `cache_prepare`: loads `metadata.json` (or synthesizes empty
    /// roots) and stamps `startup_time` once for the whole run.
    pub fn prepare(config: &CacheConfig) -> Cache {
        let (tree, rsync_root, https_root) = load_metadata(&config.local_repository_root);
        log::info!(
            "cache_prepare: loaded tree under {}",
            config.local_repository_root.display()
        );
        Cache {
            tree,
            rsync_root,
            https_root,
            startup_time: Utc::now(),
            local_repository_root: config.local_repository_root.clone(),
        }
    }

    fn fs_path(&self, node: NodeId) -> Result<PathBuf, rpki_cache_core::CacheError> {
        node_fs_path(&self.local_repository_root, &self.tree, node)
    }

    /// `cache_download`: walk/create the tree for `uri`'s segments,
    /// detect file/directory mode flips, invoke the fetcher when the
    /// node is not fresh, and record the outcome.
    pub fn download(&mut self, uri: &Uri, fetcher: &dyn Fetcher) -> DownloadOutcome {
        let (root, recursive) = match uri.transport {
            Transport::Rsync => (self.rsync_root, true),
            Transport::Https => (self.https_root, false),
        };

        let node = self.descend(root, &uri.segments, recursive);

        if self.tree.node(node).is_fresh(self.startup_time) {
            return DownloadOutcome { error_code: self.tree.node(node).error, changed: None };
        }

        if !recursive && !self.tree.node(node).is_file() {
            self.remove_path(node, true);
        }

        let (error_code, changed) = match uri.transport {
            Transport::Rsync => (fetcher.fetch_subtree(uri), None),
            Transport::Https => {
                let (code, changed) = fetcher.fetch_object(uri);
                (code, Some(changed))
            }
        };

        let now = Utc::now();
        {
            let n = self.tree.node_mut(node);
            n.error = error_code;
            n.flags.insert(NodeFlags::DIRECT);
            n.ts_attempt = Some(now);
            if error_code == 0 {
                n.flags.insert(NodeFlags::SUCCESS);
                if matches!(uri.transport, Transport::Https) {
                    n.flags.insert(NodeFlags::FILE);
                }
                n.ts_success = Some(now);
            }
        }

        // Essential for recursive transports (descendants are now
        // covered by the parent fetch); a no-op for non-recursive
        // ones (a freshly fetched leaf has no children, and a
        // directory-to-file transition already cleared them above).
        self.tree.drop_children(node);

        DownloadOutcome { error_code, changed }
    }

    /// Segment-by-segment descent, materializing missing nodes and
    /// detecting file->directory mode flips along the way. Returns
    /// early (by taking an ancestor's coverage) only from the call
    /// site in `download`, via the `DownloadOutcome` fast path below.
    fn descend(&mut self, root: NodeId, segments: &[String], recursive: bool) -> NodeId {
        let mut current = root;
        let mut i = 0;

        while i < segments.len() {
            if self.tree.node(current).is_file() {
                self.remove_path(current, false);
                let n = self.tree.node_mut(current);
                n.flags = NodeFlags::empty();
                n.ts_success = None;
                n.ts_attempt = None;
                n.error = 0;
            }

            match self.tree.child(current, &segments[i]) {
                Some(child) => {
                    if recursive && self.tree.node(child).is_fresh(self.startup_time) && self.tree.node(child).is_success() {
                        // An ancestor-equivalent fetch already covers this
                        // descendant; signal the caller via a sentinel
                        // "already at a fresh, successful node" by jumping
                        // straight to it — `download` re-checks freshness
                        // on the returned node and returns immediately.
                        return child;
                    }
                    current = child;
                    i += 1;
                }
                None => {
                    for segment in &segments[i..] {
                        current = self.tree.add_child(current, segment);
                    }
                    i = segments.len();
                }
            }
        }

        current
    }

    fn remove_path(&self, node: NodeId, as_directory: bool) {
        let path = match self.fs_path(node) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("cache_download: computing path for node failed: {e}");
                return;
            }
        };
        let result = if as_directory { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
        if let Err(e) = result {
            if e.kind() != ErrorKind::NotFound {
                log::warn!("cache_download: removing {} failed: {e}", path.display());
            }
        }
    }

    /// `cache_cleanup`: sweep both roots against the filesystem, then
    /// persist the surviving tree.
    pub fn cleanup(&mut self) {
        sweep(&mut self.tree, self.rsync_root, self.startup_time, &self.local_repository_root);
        sweep(&mut self.tree, self.https_root, self.startup_time, &self.local_repository_root);

        if let Err(e) = dump_metadata(&self.local_repository_root, &self.tree, self.rsync_root, self.https_root) {
            log::error!("cache_cleanup: failed to write metadata.json: {e}");
        } else {
            log::info!("cache_cleanup: metadata.json written");
        }
    }

    /// `cache_teardown`: frees both roots, including the roots
    /// themselves. Dropping `self` already frees the arena; this
    /// method exists to keep the four-call lifecycle explicit at the
    /// API boundary.
    pub fn teardown(self) {
        drop(self);
    }
}
