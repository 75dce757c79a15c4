// Wed Jan 15 2026 - Alex

use crate::memory::{Address, MemoryError};

/// Raw access to another process's address space.
///
/// Implementations must never panic on a bad address; a failed read is an
/// ordinary `Err` the caller skips past.
pub trait MemoryReader: Send + Sync {
    /// Reads exactly `len` bytes or fails.
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError>;

    /// Reads as many bytes as are readable starting at `addr`, up to `max_len`.
    ///
    /// Only fails when not even the first byte is readable.
    fn read_available(&self, addr: Address, max_len: usize) -> Result<Vec<u8>, MemoryError>;

    fn read_u16(&self, addr: Address) -> Result<u16, MemoryError> {
        let bytes = self.read_bytes(addr, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, addr: Address) -> Result<u32, MemoryError> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&self, addr: Address) -> Result<u64, MemoryError> {
        let bytes = self.read_bytes(addr, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        Ok(u64::from_le_bytes(raw))
    }

    /// Reads a pointer of the target's width, zero-extended.
    fn read_ptr(&self, addr: Address, pointer_size: usize) -> Result<Address, MemoryError> {
        match pointer_size {
            4 => Ok(Address::new(self.read_u32(addr)? as u64)),
            _ => Ok(Address::new(self.read_u64(addr)?)),
        }
    }
}
