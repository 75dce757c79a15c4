// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryRange, MemoryRegion};

/// The target's memory map, sorted by base address.
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    regions: Vec<MemoryRegion>,
}

impl MemoryMap {
    pub fn new(mut regions: Vec<MemoryRegion>) -> Self {
        regions.sort_by_key(|r| r.start());
        Self { regions }
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn find_region(&self, addr: Address) -> Option<&MemoryRegion> {
        let idx = self.regions.partition_point(|r| r.end().as_u64() <= addr.as_u64());
        self.regions.get(idx).filter(|r| r.contains(addr))
    }

    /// Whether every byte of `range` lies in committed, readable memory.
    /// Adjacent regions may jointly cover the range.
    pub fn is_range_fully_readable(&self, range: &MemoryRange) -> bool {
        if range.is_empty() {
            return false;
        }
        let mut cursor = range.start();
        while cursor < range.end() {
            match self.find_region(cursor) {
                Some(region) if region.is_readable() => cursor = region.end(),
                _ => return false,
            }
        }
        true
    }

    /// Clips a window around `addr` to the readable region holding it.
    pub fn readable_window(&self, addr: Address, window: u64) -> Option<MemoryRange> {
        let region = self.find_region(addr).filter(|r| r.is_readable())?;
        let half = window / 2;
        let start = addr.as_u64().saturating_sub(half).max(region.start().as_u64());
        let end = addr.as_u64().saturating_add(half).min(region.end().as_u64());
        if end <= start {
            return None;
        }
        Some(MemoryRange::new(Address::new(start), Address::new(end)))
    }
}
