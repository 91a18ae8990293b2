//! CLI command handlers, one per file.

mod clean;
mod probe;
mod run;

pub use clean::run_clean;
pub use probe::run_probe;
pub use run::run_session;
