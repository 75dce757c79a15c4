// Tue Jan 13 2026 - Alex

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Page protection word as the OS reports it for a region.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PageProtection: u32 {
        const NOACCESS = 0x01;
        const READONLY = 0x02;
        const READWRITE = 0x04;
        const WRITECOPY = 0x08;
        const EXECUTE = 0x10;
        const EXECUTE_READ = 0x20;
        const EXECUTE_READWRITE = 0x40;
        const EXECUTE_WRITECOPY = 0x80;
        const GUARD = 0x100;
        const NOCACHE = 0x200;
        const WRITECOMBINE = 0x400;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protection {
    None = 0,
    Read = 1,
    Write = 2,
    Execute = 4,
    ReadWrite = 3,
    ReadExecute = 5,
    ReadWriteExecute = 7,
}

impl Protection {
    pub fn from_flags(flags: u32) -> Self {
        match flags & 7 {
            1 => Self::Read,
            2 => Self::Write,
            3 => Self::ReadWrite,
            4 => Self::Execute,
            5 => Self::ReadExecute,
            7 => Self::ReadWriteExecute,
            _ => Self::None,
        }
    }

    /// Collapses a page protection word to rwx. Guard pages read as
    /// inaccessible since touching them faults.
    pub fn from_page_protection(protect: PageProtection) -> Self {
        if protect.contains(PageProtection::GUARD) || protect.contains(PageProtection::NOACCESS) {
            return Self::None;
        }
        let mut flags = 0u32;
        if protect.intersects(
            PageProtection::READONLY
                | PageProtection::READWRITE
                | PageProtection::WRITECOPY
                | PageProtection::EXECUTE_READ
                | PageProtection::EXECUTE_READWRITE
                | PageProtection::EXECUTE_WRITECOPY,
        ) {
            flags |= 1;
        }
        if protect.intersects(
            PageProtection::READWRITE
                | PageProtection::WRITECOPY
                | PageProtection::EXECUTE_READWRITE
                | PageProtection::EXECUTE_WRITECOPY,
        ) {
            flags |= 2;
        }
        if protect.intersects(
            PageProtection::EXECUTE
                | PageProtection::EXECUTE_READ
                | PageProtection::EXECUTE_READWRITE
                | PageProtection::EXECUTE_WRITECOPY,
        ) {
            flags |= 4;
        }
        Self::from_flags(flags)
    }

    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite | Self::ReadExecute | Self::ReadWriteExecute)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite | Self::ReadWriteExecute)
    }

    pub fn can_execute(self) -> bool {
        matches!(self, Self::Execute | Self::ReadExecute | Self::ReadWriteExecute)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "---"),
            Self::Read => write!(f, "r--"),
            Self::Write => write!(f, "-w-"),
            Self::Execute => write!(f, "--x"),
            Self::ReadWrite => write!(f, "rw-"),
            Self::ReadExecute => write!(f, "r-x"),
            Self::ReadWriteExecute => write!(f, "rwx"),
        }
    }
}
