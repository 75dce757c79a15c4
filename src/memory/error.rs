// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read failed at address 0x{0:x}")]
    ReadFailed(u64),
    #[error("Partial read at 0x{address:x}: wanted {wanted} bytes, got {got}")]
    PartialRead { address: u64, wanted: usize, got: usize },
    #[error("Invalid memory range: 0x{0:x} + 0x{1:x} overflows")]
    InvalidRange(u64, u64),
    #[error("Process not found: {0}")]
    ProcessNotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Not supported: {0}")]
    NotSupported(String),
}
