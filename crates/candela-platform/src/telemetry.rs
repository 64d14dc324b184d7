//! Memory Telemetry
//!
//! Resident memory of the current process for the performance overlay, read
//! through `sysinfo`. When the process cannot be looked up, reads fail with
//! [`PlatformError::MissingTelemetry`].

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

use candela_core::MemoryTelemetry;

use crate::{PlatformError, PlatformResult};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Resident memory of the current process
pub struct ProcessMemory {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl ProcessMemory {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                log::debug!("Current pid unavailable: {}", err);
                None
            }
        };

        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }

    /// Resident set size in megabytes
    pub fn read_mb(&self) -> PlatformResult<f64> {
        let pid = self
            .pid
            .ok_or_else(|| PlatformError::MissingTelemetry(String::from("current pid unavailable")))?;

        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);

        let process = system
            .process(pid)
            .ok_or_else(|| PlatformError::MissingTelemetry(format!("process {} not found", pid)))?;
        Ok(process.memory() as f64 / BYTES_PER_MB)
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessMemory").field("pid", &self.pid).finish()
    }
}

impl MemoryTelemetry for ProcessMemory {
    fn used_memory_mb(&self) -> Option<f64> {
        match self.read_mb() {
            Ok(mb) => Some(mb),
            Err(err) => {
                log::trace!("memory sample skipped: {}", err);
                None
            }
        }
    }
}
