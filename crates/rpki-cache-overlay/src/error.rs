use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported slurmVersion {0}, expected 1")]
    UnsupportedVersion(u64),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
