//! Structural signatures of routing blocks.

use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 digest of a block's structure.
///
/// Two routing blocks with equal hashes are treated as the same block type
/// and share one module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(u128);

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:032x})", self.0)
    }
}

/// Streams typed fields into a [`ContentHash`].
///
/// Strings are length-prefixed, so `("ab", "c")` and `("a", "bc")` differ.
pub struct ContentHasher {
    state: Xxh3,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    /// An empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds a string field.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.u64(value.len() as u64);
        self.state.update(value.as_bytes());
        self
    }

    /// Feeds an integer field.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.state.update(&value.to_le_bytes());
        self
    }

    /// The digest of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128())
    }
}
