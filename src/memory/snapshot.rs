//! In-memory port over a raw guest memory image.
//!
//! Used for offline inspection of a memory dump and as the backing store for
//! tests. Writes modify the in-memory copy only.

use crate::error::{DagError, DagResult};
use crate::memory::MemoryPort;

use anyhow::Context;
use std::cell::RefCell;
use std::io;
use std::path::Path;

pub struct SnapshotMemory {
    bytes: RefCell<Vec<u8>>,
}

impl SnapshotMemory {
    #[cfg(test)]
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: RefCell::new(vec![0; len]),
        }
    }

    /// Load a dump whose byte 0 is guest address 0.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read memory dump {}", path.display()))?;
        Ok(Self {
            bytes: RefCell::new(bytes),
        })
    }

    fn range(&self, address: u32, len: usize) -> DagResult<std::ops::Range<usize>> {
        let start = address as usize;
        let end = start.checked_add(len);
        match end {
            Some(end) if end <= self.bytes.borrow().len() => Ok(start..end),
            _ => Err(DagError::Access {
                address,
                len,
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "outside memory image"),
            }),
        }
    }
}

impl MemoryPort for SnapshotMemory {
    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> DagResult<()> {
        let range = self.range(address, buf.len())?;
        buf.copy_from_slice(&self.bytes.borrow()[range]);
        Ok(())
    }

    fn write_bytes(&self, address: u32, data: &[u8]) -> DagResult<()> {
        let range = self.range(address, data.len())?;
        self.bytes.borrow_mut()[range].copy_from_slice(data);
        Ok(())
    }
}
