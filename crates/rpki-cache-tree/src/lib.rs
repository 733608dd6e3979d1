pub mod metadata;
pub mod node;
pub mod path_builder;

pub use metadata::{dump as dump_metadata, load as load_metadata, HTTPS_LABEL, RSYNC_LABEL};
pub use node::{CacheNode, NodeFlags, NodeId, NodeTree};
pub use path_builder::PathBuilder;
