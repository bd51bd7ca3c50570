//! Live emulator process access.

use crate::error::{DagError, DagResult};
use crate::memory::MemoryPort;

use process_memory::{CopyAddress, ProcessHandle, PutAddress, TryIntoProcessHandle};
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// Default host address of guest address 0 (PCSX2 1.6 EE memory).
pub const DEFAULT_BASE_ADDRESS: usize = 0x2000_0000;

/// An attached emulator process. Guest addresses are offset by `base`.
pub struct ProcessMemory {
    handle: ProcessHandle,
    base: usize,
}

impl ProcessMemory {
    /// Find a process whose name contains `name` (case-insensitive) and open it.
    pub fn attach(name: &str, base: usize) -> DagResult<Self> {
        let pid = find_process(name)?;
        let handle = (pid as process_memory::Pid)
            .try_into_process_handle()
            .map_err(|e| DagError::Attach(format!("open pid {}: {}", pid, e)))?;
        debug!(pid, base = %format!("{:#x}", base), "attached to {}", name);
        Ok(Self { handle, base })
    }

    fn host_address(&self, address: u32) -> usize {
        host_address(self.base, address)
    }
}

impl MemoryPort for ProcessMemory {
    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> DagResult<()> {
        self.handle
            .copy_address(self.host_address(address), buf)
            .map_err(|source| DagError::Access {
                address,
                len: buf.len(),
                source,
            })
    }

    fn write_bytes(&self, address: u32, data: &[u8]) -> DagResult<()> {
        self.handle
            .put_address(self.host_address(address), data)
            .map_err(|source| DagError::Access {
                address,
                len: data.len(),
                source,
            })
    }
}

/// Host address of a guest address. Wraps instead of overflowing; the
/// read then fails with an access error.
fn host_address(base: usize, address: u32) -> usize {
    base.wrapping_add(address as usize)
}

fn find_process(name: &str) -> DagResult<u32> {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let needle = name.to_lowercase();
    let mut pids: Vec<u32> = system
        .processes()
        .values()
        .filter(|p| p.name().to_string_lossy().to_lowercase().contains(&needle))
        .map(|p| p.pid().as_u32())
        .collect();
    pids.sort();

    pids.first()
        .copied()
        .ok_or_else(|| DagError::Attach(format!("no process named {:?} is running", name)))
}
