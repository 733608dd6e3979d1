use std::path::PathBuf;

use clap::Parser;

use crate::config::CacheConfig;

/// rpki-cache-demo - drives the local artifact cache against a mock fetcher
///
/// Exercises `cache_prepare` / `cache_download` / `cache_cleanup` /
/// `cache_teardown` against a real on-disk tree so the cache's behavior
/// can be observed without a full RPKI validator.
#[derive(Parser, Debug)]
#[command(name = "rpki-cache-demo")]
#[command(about = "Exercise the RPKI relying-party artifact cache")]
pub struct Args {
    /// Root directory the cache mirrors fetched objects under
    #[arg(long)]
    pub local_repository_root: PathBuf,

    /// Path to the SLURM-style overlay document, if any
    #[arg(long)]
    pub overlay_location: Option<PathBuf>,

    /// URIs to download, e.g. rsync://host/module/ or https://host/a/b.cer
    #[arg(long = "uri")]
    pub uris: Vec<String>,

    /// Run the cleanup sweep after the downloads
    #[arg(long)]
    pub cleanup: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

impl Args {
    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::new(self.local_repository_root.clone());
        if let Some(overlay) = &self.overlay_location {
            config = config.with_overlay(overlay.clone());
        }
        config
    }
}
