//! Console rendering of plans, estimates and final statistics.

use afdl_core::fetch_head::{SizeEstimate, SizeSource};
use afdl_core::memory::bytes_to_mib;
use afdl_core::scheduler::BatchPlan;
use afdl_core::stats::DownloadStats;

pub const DISK_ONLY_WARNING: &str = "Warning: Running in disk-based mode with reduced batch size";

pub fn estimate_line(estimate: &SizeEstimate) -> String {
    let source = match estimate.source {
        SizeSource::Head => "HEAD",
        SizeSource::Get => "GET",
        SizeSource::Default => "default",
    };
    format!(
        "Estimated file size: {:.2} MB ({})",
        bytes_to_mib(estimate.bytes),
        source
    )
}

pub fn memory_analysis(plan: &BatchPlan) -> String {
    format!(
        "╔═══════ Memory Analysis ═══════╗\n\
         ║ Available Memory: {:>8.1} MB ║\n\
         ║ Required Memory: {:>9.1} MB ║\n\
         ║ Batch Size: {:>17} ║\n\
         ║ Est. File Size: {:>10.1} MB ║\n\
         ╚═══════════════════════════════╝",
        plan.available_mib(),
        plan.required_mib(),
        plan.batch_size,
        plan.estimated_file_mib()
    )
}

pub fn completion_banner(stats: &DownloadStats) -> String {
    format!(
        "╔══════════════ Download Complete ══════════════╗\n\
         ║  Total Files: {:<31} ║\n\
         ║  Failed Downloads: {:<26} ║\n\
         ║  Data Downloaded: {:<27} ║\n\
         ║  Total Time: {:<32} ║\n\
         ╚═══════════════════════════════════════════════╝",
        stats.total_files,
        stats.failed_downloads,
        format!("{:.2} GB", stats.total_gib()),
        format!("{:.2} seconds", stats.elapsed().as_secs_f64())
    )
}
