// Tue Oct 13 2026 - Alex

use crate::memory::{MemoryError, MemoryMap, MemoryReader};
use crate::process::{ProcessInfo, SuspensionState, ThreadInfo};
use crate::structure::Bitness;
use std::sync::Arc;

/// Memory access plus process facts for one target, held for the duration of
/// a single snapshot.
pub struct ProcessReader {
    memory: Arc<dyn MemoryReader>,
    info: Arc<dyn ProcessInfo>,
    suspension_state: SuspensionState,
    memory_map: MemoryMap,
}

impl ProcessReader {
    pub fn new(
        memory: Arc<dyn MemoryReader>,
        info: Arc<dyn ProcessInfo>,
        suspension_state: SuspensionState,
    ) -> Self {
        let memory_map = MemoryMap::new(info.memory_info());
        Self {
            memory,
            info,
            suspension_state,
            memory_map,
        }
    }

    pub fn memory(&self) -> &dyn MemoryReader {
        self.memory.as_ref()
    }

    pub fn info(&self) -> &dyn ProcessInfo {
        self.info.as_ref()
    }

    pub fn suspension_state(&self) -> SuspensionState {
        self.suspension_state
    }

    pub fn bitness(&self) -> Bitness {
        Bitness::from_is_64bit(self.info.is_64bit())
    }

    /// The memory map as enumerated when the reader was opened.
    pub fn memory_map(&self) -> &MemoryMap {
        &self.memory_map
    }

    /// Live threads. A suspended target counts our own suspension in every
    /// thread's suspend count, so that one is taken back out.
    pub fn threads(&self) -> Vec<ThreadInfo> {
        let mut threads = self.info.threads();
        if self.suspension_state == SuspensionState::Suspended {
            for thread in &mut threads {
                thread.suspend_count = thread.suspend_count.saturating_sub(1);
            }
        }
        threads
    }
}

/// Something that can be opened for reading.
pub trait ProcessHandle {
    fn open(&self, suspension_state: SuspensionState) -> Result<ProcessReader, MemoryError>;
}
