//! Batch scheduler.
//!
//! Plans each batch from live memory and the session's size estimate, fans
//! out one fetch unit per file, places each payload in memory or on disk, and
//! folds the results into a single `BatchOutcome`:
//! plan → fetch (parallel) → placement → artifact write → fold.

mod batch;
mod plan;
mod unit;

pub use batch::{run_batch, run_batch_with_progress, BatchContext, BatchOutcome};
pub use plan::{plan_batch, safe_batch_size, BatchPlan};
pub use unit::{fetch_and_place, FetchResult};
