//! Adaptive batch sizing.
//!
//! `safe = max(1, floor(available / (estimated * 2)))`; the factor 2 leaves
//! room for concurrent overshoot. When even the clamped batch would not fit in
//! available memory, the batch runs disk-only (ceiling 0).

use crate::memory::bytes_to_mib;

/// Parameters for one batch. Computed before the batch, dropped after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    /// Number of fetch units to launch (>= 1).
    pub batch_size: usize,
    /// Estimated payload size per file.
    pub estimated_file_bytes: u64,
    /// Placement ceiling for this batch; 0 means disk-only.
    pub memory_ceiling_bytes: u64,
    /// Available system memory seen at planning time.
    pub available_memory_bytes: u64,
}

impl BatchPlan {
    pub fn disk_only(&self) -> bool {
        self.memory_ceiling_bytes == 0
    }

    /// Memory needed to hold the whole batch at once.
    pub fn required_memory_bytes(&self) -> u64 {
        (self.batch_size as u64).saturating_mul(self.estimated_file_bytes)
    }

    pub fn available_mib(&self) -> f64 {
        bytes_to_mib(self.available_memory_bytes)
    }

    pub fn required_mib(&self) -> f64 {
        bytes_to_mib(self.required_memory_bytes())
    }

    pub fn estimated_file_mib(&self) -> f64 {
        bytes_to_mib(self.estimated_file_bytes)
    }
}

/// Largest batch that keeps twice the estimated payload per file within available memory.
/// A zero estimate imposes no bound.
pub fn safe_batch_size(available_bytes: u64, estimated_file_bytes: u64) -> usize {
    if estimated_file_bytes == 0 {
        return usize::MAX;
    }
    let per_file = estimated_file_bytes.saturating_mul(2);
    let fits = available_bytes / per_file;
    usize::try_from(fits).unwrap_or(usize::MAX).max(1)
}

/// Plan a batch: clamp `requested` to the safe size and pick the placement ceiling.
pub fn plan_batch(
    requested: usize,
    estimated_file_bytes: u64,
    available_bytes: u64,
    configured_ceiling_bytes: u64,
) -> BatchPlan {
    let batch_size = requested
        .max(1)
        .min(safe_batch_size(available_bytes, estimated_file_bytes));
    let mut plan = BatchPlan {
        batch_size,
        estimated_file_bytes,
        memory_ceiling_bytes: configured_ceiling_bytes,
        available_memory_bytes: available_bytes,
    };
    if available_bytes <= plan.required_memory_bytes() {
        plan.memory_ceiling_bytes = 0;
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MIB;

    #[test]
    fn clamps_to_safe_batch_size() {
        let plan = plan_batch(20, 50 * MIB, 1000 * MIB, 300 * MIB);
        assert_eq!(plan.batch_size, 10);
        assert_eq!(plan.memory_ceiling_bytes, 300 * MIB);
        assert!(!plan.disk_only());
    }

    #[test]
    fn requested_smaller_than_safe_is_kept() {
        let plan = plan_batch(5, MIB, 8 * 1024 * MIB, 300 * MIB);
        assert_eq!(plan.batch_size, 5);
    }

    #[test]
    fn safe_size_floors_and_never_drops_below_one() {
        assert_eq!(safe_batch_size(1000 * MIB, 50 * MIB), 10);
        assert_eq!(safe_batch_size(999 * MIB, 50 * MIB), 9);
        assert_eq!(safe_batch_size(10 * MIB, 50 * MIB), 1);
        assert_eq!(safe_batch_size(0, MIB), 1);
    }

    #[test]
    fn zero_estimate_is_unbounded() {
        assert_eq!(safe_batch_size(0, 0), usize::MAX);
        assert_eq!(plan_batch(20, 0, 100 * MIB, 300 * MIB).batch_size, 20);
    }

    #[test]
    fn insufficient_memory_degrades_to_disk_only() {
        let plan = plan_batch(20, 50 * MIB, 60 * MIB, 300 * MIB);
        assert_eq!(plan.batch_size, 1);
        assert!(!plan.disk_only());

        let plan = plan_batch(20, 50 * MIB, 40 * MIB, 300 * MIB);
        assert_eq!(plan.batch_size, 1);
        assert!(plan.disk_only());
    }

    #[test]
    fn unknown_memory_plans_minimal_disk_only_batch() {
        let plan = plan_batch(20, MIB, 0, 300 * MIB);
        assert_eq!(plan.batch_size, 1);
        assert!(plan.disk_only());
    }

    #[test]
    fn zero_request_still_runs_one() {
        assert_eq!(plan_batch(0, MIB, 1024 * MIB, 300 * MIB).batch_size, 1);
    }
}
