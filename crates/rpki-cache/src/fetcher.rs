//! The transport seam: fetch implementations are out of scope, so
//! the coordinator calls through this trait object instead of
//! linking against a concrete fetcher.

use crate::uri::Uri;

pub trait Fetcher {
    /// Synchronous whole-subtree fetch (file-sync transport).
    fn fetch_subtree(&self, uri: &Uri) -> i32;

    /// Synchronous single-object fetch (HTTP transport). The second
    /// element is `true` iff the object's bytes differ from a prior
    /// fetch.
    fn fetch_object(&self, uri: &Uri) -> (i32, bool);
}

/// Outcome of `Cache::download`. `changed` mirrors the original's
/// `out_changed` pointer: populated only for HTTP URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub error_code: i32,
    pub changed: Option<bool>,
}
