pub mod cli;
pub mod config;
pub mod error;

pub use cli::{parse_args, Args};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
