// Sat Oct 17 2026 - Alex

use crate::process::ProcessReader;
use crate::structure::Bitness;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuArchitecture {
    X86,
    #[default]
    X86_64,
}

impl From<Bitness> for CpuArchitecture {
    fn from(bitness: Bitness) -> Self {
        match bitness {
            Bitness::Bits32 => CpuArchitecture::X86,
            Bitness::Bits64 => CpuArchitecture::X86_64,
        }
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuArchitecture::X86 => write!(f, "x86"),
            CpuArchitecture::X86_64 => write!(f, "x86_64"),
        }
    }
}

/// Facts about the machine the target runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_architecture: CpuArchitecture,
    pub cpu_count: usize,
    pub os_name: String,
    pub os_version: Option<String>,
}

impl SystemSnapshot {
    pub fn capture(reader: &ProcessReader) -> Self {
        Self {
            cpu_architecture: reader.bitness().into(),
            cpu_count: num_cpus::get(),
            os_name: std::env::consts::OS.to_string(),
            os_version: reader.info().os_version(),
        }
    }
}
