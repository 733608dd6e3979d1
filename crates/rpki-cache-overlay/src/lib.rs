//! Loader for the SLURM-style local exception document: filters and
//! assertions over prefixes and BGPsec router keys, layered on top of
//! validated RPKI output.

pub mod base64url;
pub mod document;
pub mod error;
pub mod prefix;

pub use document::{load, BgpsecAssertion, BgpsecFilter, OverlayDocument, PrefixAssertion, PrefixFilter};
pub use error::{OverlayError, OverlayResult};
