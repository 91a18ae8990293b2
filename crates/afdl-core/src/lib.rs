pub mod config;
pub mod logging;

pub mod fetch;
pub mod fetch_head;
pub mod memory;
pub mod placement;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod storage;
pub mod sweep;
