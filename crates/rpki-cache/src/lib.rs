//! Download coordination on top of `rpki_cache_tree`'s arena: decides
//! what is already fresh, what needs a fetch, and reconciles the tree
//! against the filesystem mirror at the end of a run.

pub mod cache;
pub mod fetcher;
pub mod paths;
pub mod sweep;
pub mod uri;

pub use cache::Cache;
pub use fetcher::{DownloadOutcome, Fetcher};
pub use uri::{Transport, Uri};
