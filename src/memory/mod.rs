//! Remote memory port: typed access to the emulated machine's memory.
//!
//! All addresses are guest addresses (32-bit). Implementations translate them
//! into whatever backing store they wrap (a live emulator process, a dump).

pub mod process;
pub mod snapshot;

pub use process::ProcessMemory;
pub use snapshot::SnapshotMemory;

use crate::error::DagResult;
use byteorder::{ByteOrder, LE};

/// Upper bound for null-terminated string reads.
pub const MAX_CSTRING_LEN: usize = 64;

/// Value kinds supported by the port.
pub trait MemoryPort {
    /// Fill `buf` with the bytes at `address`.
    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> DagResult<()>;

    /// Store `data` at `address`.
    fn write_bytes(&self, address: u32, data: &[u8]) -> DagResult<()>;

    fn read_u32(&self, address: u32) -> DagResult<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(address, &mut buf)?;
        Ok(LE::read_u32(&buf))
    }

    fn write_u32(&self, address: u32, value: u32) -> DagResult<()> {
        let mut buf = [0u8; 4];
        LE::write_u32(&mut buf, value);
        self.write_bytes(address, &buf)
    }

    /// Read a null-terminated string of at most `max_len` bytes.
    fn read_cstring(&self, address: u32, max_len: usize) -> DagResult<String> {
        let mut bytes = vec![0u8; max_len];
        self.read_bytes(address, &mut bytes)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn u32_values_are_little_endian() {
        let mem = SnapshotMemory::zeroed(0x100);
        mem.write_bytes(0x10, &[0x78, 0x56, 0x34, 0x12]).unwrap();
        assert_eq!(mem.read_u32(0x10).unwrap(), 0x1234_5678);

        mem.write_u32(0x20, 0xdead_beef).unwrap();
        let mut raw = [0u8; 4];
        mem.read_bytes(0x20, &mut raw).unwrap();
        assert_eq!(raw, [0xef, 0xbe, 0xad, 0xde]);
    }

    #[test]
    fn cstring_stops_at_nul() {
        let mem = SnapshotMemory::zeroed(0x100);
        mem.write_bytes(0x40, b"SCUS_973.16\0garbage").unwrap();
        assert_eq!(mem.read_cstring(0x40, 32).unwrap(), "SCUS_973.16");
    }

    #[test]
    fn cstring_without_nul_is_truncated_to_max_len() {
        let mem = SnapshotMemory::zeroed(0x100);
        mem.write_bytes(0x00, b"abcdefgh").unwrap();
        assert_eq!(mem.read_cstring(0x00, 4).unwrap(), "abcd");
    }
}
