use std::io;

use thiserror::Error;

/// Errors raised by the cache and its collaborators.
///
/// One variant per failure kind, mirroring the original's error codes:
/// callers distinguish "not found" from "malformed" from "I/O" instead
/// of matching on a raw integer.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("path too long: limit={limit} actual={actual}")]
    PathTooLong { limit: usize, actual: usize },
}

pub type CacheResult<T> = Result<T, CacheError>;
