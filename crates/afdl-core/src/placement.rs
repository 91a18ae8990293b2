//! In-memory vs on-disk placement of a fetched payload.
//!
//! The decision is advisory: nothing is reserved, so units deciding in
//! parallel may together push the process past the ceiling. The ceiling is a
//! soft limit.

use crate::memory::{self, MemoryProbe};

/// Where a fetched payload ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Counted toward statistics, then dropped.
    Memory,
    /// Written to the download directory as an artifact before being dropped.
    Disk,
}

/// Decide placement from the process's current memory usage.
/// A ceiling of zero always yields `Disk`.
pub fn decide(payload_bytes: u64, ceiling_bytes: u64, probe: &dyn MemoryProbe) -> Placement {
    if ceiling_bytes == 0 {
        return Placement::Disk;
    }
    decide_with_usage(memory::usage_or_max(probe), payload_bytes, ceiling_bytes)
}

/// Memory iff `usage + payload < ceiling`.
pub fn decide_with_usage(usage_bytes: u64, payload_bytes: u64, ceiling_bytes: u64) -> Placement {
    if usage_bytes.saturating_add(payload_bytes) < ceiling_bytes {
        Placement::Memory
    } else {
        Placement::Disk
    }
}
