// Tue Jan 13 2026 - Alex

use crate::memory::{Address, MemoryRange, PageProtection, Protection};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionState {
    Commit,
    Reserve,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Image,
    Mapped,
    Private,
    Unknown,
}

/// One entry of the target's virtual memory map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    range: MemoryRange,
    allocation_base: Address,
    allocation_protect: PageProtection,
    state: RegionState,
    protect: PageProtection,
    kind: RegionKind,
    name: Option<String>,
}

impl MemoryRegion {
    pub fn new(range: MemoryRange, protect: PageProtection, state: RegionState) -> Self {
        Self {
            range,
            allocation_base: range.start(),
            allocation_protect: protect,
            state,
            protect,
            kind: RegionKind::Private,
            name: None,
        }
    }

    pub fn committed(range: MemoryRange, protect: PageProtection) -> Self {
        Self::new(range, protect, RegionState::Commit)
    }

    pub fn with_kind(mut self, kind: RegionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn range(&self) -> &MemoryRange {
        &self.range
    }

    pub fn allocation_base(&self) -> Address {
        self.allocation_base
    }

    pub fn allocation_protect(&self) -> PageProtection {
        self.allocation_protect
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn protect(&self) -> PageProtection {
        self.protect
    }

    pub fn protection(&self) -> Protection {
        Protection::from_page_protection(self.protect)
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start(&self) -> Address {
        self.range.start()
    }

    pub fn end(&self) -> Address {
        self.range.end()
    }

    pub fn size(&self) -> u64 {
        self.range.size()
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.range.contains(addr)
    }

    pub fn is_readable(&self) -> bool {
        self.state == RegionState::Commit && self.protection().can_read()
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?} {:?}", self.range, self.protection(), self.state, self.kind)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        Ok(())
    }
}
