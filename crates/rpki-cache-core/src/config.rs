use std::path::PathBuf;

/// Configuration the cache reads; everything else (CLI parsing, the
/// global configuration store) is out of scope for this crate.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub local_repository_root: PathBuf,
    pub overlay_location: Option<PathBuf>,
}

impl CacheConfig {
    pub fn new(local_repository_root: impl Into<PathBuf>) -> Self {
        CacheConfig {
            local_repository_root: local_repository_root.into(),
            overlay_location: None,
        }
    }

    pub fn with_overlay(mut self, overlay_location: impl Into<PathBuf>) -> Self {
        self.overlay_location = Some(overlay_location.into());
        self
    }
}
