// Wed Oct 14 2026 - Alex

use crate::memory::{Address, MemoryError};
use crate::structure::Bitness;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to open process: {0}")]
    OpenFailed(#[source] MemoryError),
    #[error("{what} at {address} could not be read: {source}")]
    Unreadable {
        what: &'static str,
        address: Address,
        #[source]
        source: MemoryError,
    },
    #[error("{what} at {address} is truncated")]
    Truncated { what: &'static str, address: Address },
    #[error("{what} not present")]
    Missing { what: &'static str },
    #[error("Reader is {reader}, target is {target}")]
    BitnessMismatch { reader: Bitness, target: Bitness },
    #[error("Bad signature 0x{found:08x} at {address}")]
    BadSignature { address: Address, found: u32 },
    #[error("List at {head} exceeded {cap} nodes")]
    NodeCapExceeded { head: Address, cap: usize },
}

impl SnapshotError {
    pub fn unreadable(what: &'static str, address: Address, source: MemoryError) -> Self {
        Self::Unreadable {
            what,
            address,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
