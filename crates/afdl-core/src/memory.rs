//! Point-in-time memory probing.
//!
//! Reads system available memory and the current process's resident memory
//! through `sysinfo`. Every call builds a fresh snapshot; nothing is cached.
//! `None` means the value could not be read; callers pick the conservative
//! fallback (see [`available_or_zero`] and [`usage_or_max`]).

use sysinfo::{Pid, ProcessRefreshKind, System};

pub const MIB: u64 = 1024 * 1024;

/// Source of memory readings used by batch planning and placement.
pub trait MemoryProbe: Send + Sync {
    /// Currently available system memory in bytes.
    fn available_memory_bytes(&self) -> Option<u64>;
    /// Resident memory of the running process in bytes.
    fn process_memory_bytes(&self) -> Option<u64>;
}

/// Reads live values from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemoryProbe;

impl MemoryProbe for SystemMemoryProbe {
    fn available_memory_bytes(&self) -> Option<u64> {
        let mut sys = System::new();
        sys.refresh_memory();
        match sys.available_memory() {
            0 => None,
            n => Some(n),
        }
    }

    fn process_memory_bytes(&self) -> Option<u64> {
        let mut sys = System::new();
        let pid = Pid::from_u32(std::process::id());
        if !sys.refresh_process_specifics(pid, ProcessRefreshKind::new().with_memory()) {
            return None;
        }
        sys.process(pid).map(|p| p.memory())
    }
}

/// Available memory, treating an unreadable value as zero.
pub fn available_or_zero(probe: &dyn MemoryProbe) -> u64 {
    probe.available_memory_bytes().unwrap_or_else(|| {
        tracing::warn!("available memory unknown; assuming none");
        0
    })
}

/// Process usage, treating an unreadable value as maximal.
pub fn usage_or_max(probe: &dyn MemoryProbe) -> u64 {
    probe.process_memory_bytes().unwrap_or(u64::MAX)
}

pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// Fixed readings, for planning previews and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMemoryProbe {
    pub available: Option<u64>,
    pub process: Option<u64>,
}

impl MemoryProbe for StaticMemoryProbe {
    fn available_memory_bytes(&self) -> Option<u64> {
        self.available
    }

    fn process_memory_bytes(&self) -> Option<u64> {
        self.process
    }
}
