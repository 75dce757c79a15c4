// Tue Oct 13 2026 - Alex

use crate::memory::{Address, MemoryRange, MemoryRegion};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Whether the caller stopped the target before handing it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspensionState {
    Running,
    Suspended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    pub user: Duration,
    pub system: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub base: Address,
    pub size: u64,
    pub timestamp: u32,
    pub checksum: u32,
    /// Location of the module's client info record, if the module carries one.
    pub client_info: Option<Address>,
}

impl ModuleInfo {
    pub fn new(name: &str, base: Address, size: u64) -> Self {
        Self {
            name: name.to_string(),
            base,
            size,
            timestamp: 0,
            checksum: 0,
            client_info: None,
        }
    }

    pub fn with_client_info(mut self, address: Address) -> Self {
        self.client_info = Some(address);
        self
    }

    pub fn with_image_stamp(mut self, timestamp: u32, checksum: u32) -> Self {
        self.timestamp = timestamp;
        self.checksum = checksum;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadContext {
    /// The OS context record exactly as captured.
    pub raw: Vec<u8>,
    /// General-purpose register values, used to find indirectly referenced memory.
    pub registers: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: u32,
    pub suspend_count: u32,
    pub priority_class: u32,
    pub priority: i32,
    /// Thread environment block address and size, where the OS has one.
    pub teb: Option<(Address, u64)>,
    /// Stack bounds when known without reading the TEB.
    pub stack_region: Option<MemoryRange>,
    pub stack_pointer: Address,
    pub context: ThreadContext,
}

impl ThreadInfo {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            suspend_count: 0,
            priority_class: 0,
            priority: 0,
            teb: None,
            stack_region: None,
            stack_pointer: Address::zero(),
            context: ThreadContext::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleInfo {
    pub handle: u32,
    pub type_name: String,
    pub object_name: String,
    pub attributes: u32,
    pub granted_access: u32,
    pub pointer_count: u32,
    pub handle_count: u32,
}

/// Where the OS keeps its ring of recently unloaded modules.
///
/// The three addresses are resolved in the reader's own address space. They
/// name variables in a system library mapped at the same base in every
/// process of the same width, so they are only meaningful for a target whose
/// pointer width matches the reader's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadTraceLocation {
    pub element_size: Address,
    pub element_count: Address,
    pub trace_pointer: Address,
}

/// Process-level facts and live enumerations supplied by the platform.
pub trait ProcessInfo: Send + Sync {
    fn process_id(&self) -> u32;
    fn parent_process_id(&self) -> u32;
    fn is_64bit(&self) -> bool;
    /// Address and size of the process environment block.
    fn peb(&self) -> Option<(Address, u64)>;
    fn start_time(&self) -> SystemTime;
    fn cpu_times(&self) -> CpuTimes;
    fn modules(&self) -> Vec<ModuleInfo>;
    fn threads(&self) -> Vec<ThreadInfo>;
    fn handles(&self) -> Vec<HandleInfo>;
    fn memory_info(&self) -> Vec<MemoryRegion>;

    fn unload_trace_location(&self) -> Option<UnloadTraceLocation> {
        None
    }

    fn os_version(&self) -> Option<String> {
        None
    }
}
