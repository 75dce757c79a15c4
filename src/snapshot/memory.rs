// Wed Oct 14 2026 - Alex

use crate::memory::{Address, MemoryMap, MemoryRange, MemoryReader};
use crate::process::ProcessReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryContents {
    Captured(Vec<u8>),
    /// The range looked mapped but the read still failed.
    Unreadable,
}

/// One captured range of target memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    address: Address,
    size: u64,
    contents: MemoryContents,
}

impl MemorySnapshot {
    /// Reads the range now. A failed read yields an `Unreadable` snapshot
    /// instead of an error.
    pub fn capture(reader: &dyn MemoryReader, address: Address, size: u64) -> Self {
        let contents = usize::try_from(size)
            .ok()
            .and_then(|len| reader.read_bytes(address, len).ok())
            .map(MemoryContents::Captured)
            .unwrap_or_else(|| {
                log::warn!("memory at {} (0x{:x} bytes) unreadable", address, size);
                MemoryContents::Unreadable
            });
        Self {
            address,
            size,
            contents,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn contents(&self) -> &MemoryContents {
        &self.contents
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.contents {
            MemoryContents::Captured(bytes) => Some(bytes),
            MemoryContents::Unreadable => None,
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(self.contents, MemoryContents::Captured(_))
    }
}

/// Pool of extra memory ranges: exact-duplicate `(address, size)` pairs are
/// captured once, and the pool's total size is bounded.
///
/// Lookups are a linear scan; the pool holds a few hundred OS records at most.
#[derive(Debug, Clone)]
pub struct ExtraMemory {
    entries: Vec<MemorySnapshot>,
    total_bytes: u64,
    limit_bytes: u64,
}

impl Default for ExtraMemory {
    fn default() -> Self {
        Self::with_limit(u64::MAX)
    }
}

impl ExtraMemory {
    pub fn with_limit(limit_bytes: u64) -> Self {
        Self {
            entries: Vec::new(),
            total_bytes: 0,
            limit_bytes,
        }
    }

    /// Records `[address, address + size)` unless it is empty, not fully
    /// mapped and readable, already present, or over the byte limit.
    ///
    /// Returns whether a new entry was appended.
    pub fn add(
        &mut self,
        reader: &dyn MemoryReader,
        map: &MemoryMap,
        address: Address,
        size: u64,
    ) -> bool {
        if size == 0 {
            return false;
        }
        let Ok(range) = MemoryRange::checked(address, size) else {
            log::debug!("skipping overflowing range {} + 0x{:x}", address, size);
            return false;
        };
        if !map.is_range_fully_readable(&range) {
            log::debug!("skipping unmapped range {}", range);
            return false;
        }
        if self.contains(address, size) {
            return false;
        }
        if self.total_bytes.saturating_add(size) > self.limit_bytes {
            log::warn!(
                "extra memory limit of 0x{:x} bytes reached, dropping {}",
                self.limit_bytes,
                range
            );
            return false;
        }
        log::trace!("capturing {}", range);
        let snapshot = MemorySnapshot::capture(reader, address, size);
        if snapshot.is_readable() {
            self.total_bytes += size;
        }
        self.entries.push(snapshot);
        true
    }

    /// [`add`](Self::add) against an open process.
    pub fn record(&mut self, reader: &ProcessReader, address: Address, size: u64) -> bool {
        self.add(reader.memory(), reader.memory_map(), address, size)
    }

    pub fn contains(&self, address: Address, size: u64) -> bool {
        self.entries
            .iter()
            .any(|e| e.address == address && e.size == size)
    }

    pub fn snapshots(&self) -> &[MemorySnapshot] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}
