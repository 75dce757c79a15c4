// Tue Jan 13 2026 - Alex

use crate::memory::{
    Address, MemoryError, MemoryRange, MemoryReader, MemoryRegion, PageProtection,
};
use std::collections::BTreeMap;

const PAGE_SIZE: u64 = 0x1000;

/// A page-granular in-memory address space.
///
/// Used to replay a captured address space or to stand in for a target in
/// tests. Reads touching an unpopulated page fail just as they would against
/// an unmapped page of a live process.
#[derive(Debug, Clone, Default)]
pub struct SparseMemory {
    pages: BTreeMap<u64, Box<[u8]>>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size() -> u64 {
        PAGE_SIZE
    }

    /// Copies `data` in at `addr`, populating pages as needed.
    pub fn write(&mut self, addr: Address, data: &[u8]) {
        let mut cursor = addr.as_u64();
        let mut remaining = data;
        while !remaining.is_empty() {
            let page = cursor & !(PAGE_SIZE - 1);
            let offset = (cursor - page) as usize;
            let chunk = remaining.len().min(PAGE_SIZE as usize - offset);
            let buf = self
                .pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize].into_boxed_slice());
            buf[offset..offset + chunk].copy_from_slice(&remaining[..chunk]);
            remaining = &remaining[chunk..];
            cursor = cursor.wrapping_add(chunk as u64);
        }
    }

    pub fn write_u16(&mut self, addr: Address, value: u16) {
        self.write(addr, &value.to_le_bytes());
    }

    pub fn write_u32(&mut self, addr: Address, value: u32) {
        self.write(addr, &value.to_le_bytes());
    }

    pub fn write_u64(&mut self, addr: Address, value: u64) {
        self.write(addr, &value.to_le_bytes());
    }

    pub fn write_ptr(&mut self, addr: Address, value: Address, pointer_size: usize) {
        match pointer_size {
            4 => self.write_u32(addr, value.as_u64() as u32),
            _ => self.write_u64(addr, value.as_u64()),
        }
    }

    /// Maps zeroed pages covering `[addr, addr + size)`.
    pub fn map_zeroed(&mut self, addr: Address, size: u64) {
        let first = addr.as_u64() & !(PAGE_SIZE - 1);
        let mut page = first;
        while page < addr.as_u64().saturating_add(size) {
            self.pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize].into_boxed_slice());
            page += PAGE_SIZE;
        }
    }

    /// Drops every page overlapping the range, making it unreadable.
    pub fn unmap(&mut self, addr: Address, size: u64) {
        let first = addr.as_u64() & !(PAGE_SIZE - 1);
        let last = addr.as_u64().saturating_add(size);
        let doomed: Vec<u64> = self.pages.range(first..last).map(|(&p, _)| p).collect();
        for page in doomed {
            self.pages.remove(&page);
        }
    }

    /// Coalesces populated pages into committed read-write regions.
    pub fn regions(&self) -> Vec<MemoryRegion> {
        let mut regions = Vec::new();
        let mut current: Option<(u64, u64)> = None;
        for &page in self.pages.keys() {
            current = match current {
                Some((start, end)) if end == page => Some((start, page + PAGE_SIZE)),
                Some((start, end)) => {
                    regions.push(Self::region(start, end));
                    Some((page, page + PAGE_SIZE))
                }
                None => Some((page, page + PAGE_SIZE)),
            };
        }
        if let Some((start, end)) = current {
            regions.push(Self::region(start, end));
        }
        regions
    }

    fn region(start: u64, end: u64) -> MemoryRegion {
        MemoryRegion::committed(
            MemoryRange::new(Address::new(start), Address::new(end)),
            PageProtection::READWRITE,
        )
    }

    fn copy_out(&self, addr: u64, len: usize, out: &mut Vec<u8>) -> usize {
        let mut cursor = addr;
        let mut copied = 0usize;
        while copied < len {
            let page = cursor & !(PAGE_SIZE - 1);
            let offset = (cursor - page) as usize;
            let Some(buf) = self.pages.get(&page) else {
                break;
            };
            let chunk = (len - copied).min(PAGE_SIZE as usize - offset);
            out.extend_from_slice(&buf[offset..offset + chunk]);
            copied += chunk;
            match cursor.checked_add(chunk as u64) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        copied
    }
}

impl MemoryReader for SparseMemory {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut out = Vec::with_capacity(len);
        let got = self.copy_out(addr.as_u64(), len, &mut out);
        if got != len {
            return Err(MemoryError::ReadFailed(addr.as_u64()));
        }
        Ok(out)
    }

    fn read_available(&self, addr: Address, max_len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut out = Vec::new();
        if self.copy_out(addr.as_u64(), max_len, &mut out) == 0 && max_len > 0 {
            return Err(MemoryError::ReadFailed(addr.as_u64()));
        }
        Ok(out)
    }
}
