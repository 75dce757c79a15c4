// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryError, MemoryReader};
use libc::{c_void, iovec, pid_t};

const READ_CHUNK: usize = 0x1000;

/// Reads another process's memory with `process_vm_readv`.
///
/// The caller is expected to have stopped the target (or to be reading a
/// zombie); nothing here coordinates with the target.
pub struct ProcessMemory {
    pid: pid_t,
}

impl ProcessMemory {
    pub fn attach(pid: pid_t) -> Result<Self, MemoryError> {
        // Signal 0 only checks existence and permission.
        let result = unsafe { libc::kill(pid, 0) };
        if result != 0 {
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EPERM) => MemoryError::PermissionDenied(format!(
                    "Not allowed to inspect process {}. Root privileges may be required.",
                    pid
                )),
                _ => MemoryError::ProcessNotFound(format!("Process {} not found: {}", pid, err)),
            });
        }
        Ok(Self { pid })
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize, MemoryError> {
        if buffer.is_empty() {
            return Ok(0);
        }
        let local = iovec {
            iov_base: buffer.as_mut_ptr() as *mut c_void,
            iov_len: buffer.len(),
        };
        let remote = iovec {
            iov_base: address as usize as *mut c_void,
            iov_len: buffer.len(),
        };
        // SAFETY: `local` describes a live, exclusively borrowed buffer; the
        // remote iovec is only interpreted by the kernel.
        let result = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };
        if result < 0 {
            return Err(MemoryError::ReadFailed(address));
        }
        Ok(result as usize)
    }
}

impl MemoryReader for ProcessMemory {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buffer = vec![0u8; len];
        let got = self.read_into(addr.as_u64(), &mut buffer)?;
        if got != len {
            return Err(MemoryError::PartialRead {
                address: addr.as_u64(),
                wanted: len,
                got,
            });
        }
        Ok(buffer)
    }

    fn read_available(&self, addr: Address, max_len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut out = Vec::new();
        let mut cursor = addr.as_u64();
        while out.len() < max_len {
            // Stay page-aligned after the first chunk so a fault ends the read
            // at the page boundary rather than mid-chunk.
            let to_boundary = READ_CHUNK - (cursor as usize & (READ_CHUNK - 1));
            let want = to_boundary.min(max_len - out.len());
            let mut chunk = vec![0u8; want];
            match self.read_into(cursor, &mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(got) => {
                    out.extend_from_slice(&chunk[..got]);
                    if got < want {
                        break;
                    }
                    cursor = match cursor.checked_add(got as u64) {
                        Some(next) => next,
                        None => break,
                    };
                }
            }
        }
        if out.is_empty() && max_len > 0 {
            return Err(MemoryError::ReadFailed(addr.as_u64()));
        }
        Ok(out)
    }
}
