//! Minimal parsed form of a fetch URI: transport family plus the
//! path segments the coordinator descends through. URI construction
//! itself (building the remote request) is out of scope — only the
//! local path shape matters here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// File-sync: a successful fetch of a path covers all descendants.
    Rsync,
    /// Single-object HTTP: each object is fetched independently.
    Https,
}

impl Transport {
    /// Whether a successful fetch of a node implies success of its
    /// descendants.
    pub fn is_recursive(self) -> bool {
        matches!(self, Transport::Rsync)
    }
}

#[derive(Debug, Clone)]
pub struct Uri {
    pub raw: String,
    pub transport: Transport,
    pub segments: Vec<String>,
}

impl Uri {
    /// Parse `rsync://...` or `https://...` into a transport plus
    /// non-empty path segments. Any other scheme is a programmer
    /// error — the validator should never construct one — and is
    /// treated as an invariant violation, not a recoverable failure.
    pub fn parse(raw: &str) -> Uri {
        let (transport, rest) = if let Some(rest) = raw.strip_prefix("rsync://") {
            (Transport::Rsync, rest)
        } else if let Some(rest) = raw.strip_prefix("https://") {
            (Transport::Https, rest)
        } else {
            unreachable!("unknown transport for uri: {raw}");
        };

        let segments: Vec<String> = rest.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();

        Uri { raw: raw.to_string(), transport, segments }
    }
}
