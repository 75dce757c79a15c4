// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, end)` range in the target's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemoryRange {
    start: Address,
    end: Address,
}

impl MemoryRange {
    pub fn new(start: Address, end: Address) -> Self {
        assert!(end.as_u64() >= start.as_u64(), "end must be >= start");
        Self { start, end }
    }

    /// Builds a range from a base and a size read out of the target, rejecting
    /// combinations that overflow the address space.
    pub fn checked(start: Address, size: u64) -> Result<Self, MemoryError> {
        let end = start
            .checked_add(size)
            .ok_or(MemoryError::InvalidRange(start.as_u64(), size))?;
        Ok(Self { start, end })
    }

    pub fn from_start_size(start: Address, size: u64) -> Self {
        Self::new(start, start + size)
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> Address {
        self.end
    }

    pub fn size(&self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr.as_u64() >= self.start.as_u64() && addr.as_u64() < self.end.as_u64()
    }

    pub fn contains_range(&self, other: &Self) -> bool {
        other.start.as_u64() >= self.start.as_u64() && other.end.as_u64() <= self.end.as_u64()
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.as_u64() < other.end.as_u64() && self.end.as_u64() > other.start.as_u64()
    }

    pub fn intersects(&self, other: &Self) -> Option<Self> {
        let start = Address::new(self.start.as_u64().max(other.start.as_u64()));
        let end = Address::new(self.end.as_u64().min(other.end.as_u64()));
        if start.as_u64() < end.as_u64() {
            Some(Self::new(start, end))
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.as_u64() >= self.end.as_u64()
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_rejects_overflow() {
        assert!(MemoryRange::checked(Address::new(u64::MAX - 4), 16).is_err());
        let range = MemoryRange::checked(Address::new(0x1000), 0x20).unwrap();
        assert_eq!(range.end(), Address::new(0x1020));
    }

    #[test]
    fn test_intersection() {
        let a = MemoryRange::from_start_size(Address::new(0x1000), 0x100);
        let b = MemoryRange::from_start_size(Address::new(0x1080), 0x100);
        let i = a.intersects(&b).unwrap();
        assert_eq!(i.start(), Address::new(0x1080));
        assert_eq!(i.size(), 0x80);
        assert!(a.contains_range(&MemoryRange::from_start_size(Address::new(0x1010), 0x10)));
        assert!(!a.contains_range(&b));
    }
}
