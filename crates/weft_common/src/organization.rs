//! Configuration-memory organization of the fabric.

use serde::{Deserialize, Serialize};

/// How configuration memories are addressed in the generated fabric.
///
/// The organization decides which configuration ports a configurable module
/// exposes and whether shared (reserved) configuration bits exist at all.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOrganization {
    /// Every memory bit is a directly driven input (`config[n]`).
    Standalone,
    /// Memories form a shift chain threaded through `ccff_head`/`ccff_tail`.
    #[default]
    ScanChain,
    /// Memories are addressed as a bank; multiplexers may carry shared
    /// reserved bits in addition to their own.
    MemoryBank,
}

impl ConfigOrganization {
    /// Returns `true` if shared configuration bits are meaningful.
    pub fn has_shared_bits(self) -> bool {
        matches!(self, ConfigOrganization::MemoryBank)
    }
}
