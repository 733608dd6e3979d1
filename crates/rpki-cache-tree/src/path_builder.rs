//! Assembles and normalizes filesystem paths from segment lists.
//!
//! Used by the node tree (to compute a node's on-disk path from its
//! chain of `parent` pointers) and by the sweeper (to build the path
//! of a child while it walks a directory). Appends accumulate
//! segments; `reverse` rebuilds a root-to-child order after a
//! child-to-root ascent; `compile` joins with the platform separator
//! and hands ownership of the result to the caller.

use std::path::PathBuf;

use rpki_cache_core::CacheError;

/// Caps total accumulated segment length; exceeding it is reported as
/// an error rather than silently truncated.
pub(crate) const MAX_PATH_LEN: usize = 4096;

#[derive(Debug, Default, Clone)]
pub struct PathBuilder {
    segments: Vec<String>,
}

impl PathBuilder {
    pub fn new() -> Self {
        PathBuilder::default()
    }

    /// Start over with an empty segment list.
    pub fn init(&mut self) {
        self.segments.clear();
    }

    /// Push a segment, checking the accumulated length bound.
    pub fn append(&mut self, segment: &str) -> Result<(), CacheError> {
        let actual: usize = self.segments.iter().map(|s| s.len() + 1).sum::<usize>() + segment.len();
        if actual > MAX_PATH_LEN {
            return Err(CacheError::PathTooLong { limit: MAX_PATH_LEN, actual });
        }
        self.segments.push(segment.to_string());
        Ok(())
    }

    /// Drop the most recently appended segment, if any.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Reverse segment order in place; used after a child-to-root
    /// ascent to rebuild a root-to-child path.
    pub fn reverse(&mut self) {
        self.segments.reverse();
    }

    /// Borrow the joined path without consuming the builder.
    pub fn peek(&self) -> String {
        self.segments.join(std::path::MAIN_SEPARATOR_STR)
    }

    /// Join segments with the platform separator, handing ownership
    /// of the result to the caller and leaving the builder ready for
    /// reuse.
    pub fn compile(&mut self) -> PathBuf {
        let joined = self.peek();
        self.segments.clear();
        PathBuf::from(joined)
    }

    /// Abandon the in-progress path without compiling it.
    pub fn cancel(&mut self) {
        self.segments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_joins_with_separator() {
        let mut b = PathBuilder::new();
        b.append("https").unwrap();
        b.append("example.org").unwrap();
        b.append("a.cer").unwrap();
        let path = b.compile();
        assert_eq!(path, PathBuf::from(["https", "example.org", "a.cer"].join(std::path::MAIN_SEPARATOR_STR)));
    }

    #[test]
    fn compile_clears_builder() {
        let mut b = PathBuilder::new();
        b.append("a").unwrap();
        let _ = b.compile();
        assert_eq!(b.peek(), "");
    }

    #[test]
    fn reverse_flips_segment_order() {
        let mut b = PathBuilder::new();
        b.append("c").unwrap();
        b.append("b").unwrap();
        b.append("a").unwrap();
        b.reverse();
        assert_eq!(b.peek(), ["a", "b", "c"].join(std::path::MAIN_SEPARATOR_STR));
    }

    #[test]
    fn cancel_discards_segments() {
        let mut b = PathBuilder::new();
        b.append("x").unwrap();
        b.cancel();
        assert_eq!(b.peek(), "");
    }

    #[test]
    fn append_rejects_too_long_path() {
        let mut b = PathBuilder::new();
        let long = "a".repeat(MAX_PATH_LEN + 1);
        assert!(matches!(b.append(&long), Err(CacheError::PathTooLong { .. })));
    }
}
