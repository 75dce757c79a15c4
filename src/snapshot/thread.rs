// Sat Oct 17 2026 - Alex

use crate::config::SnapshotConfig;
use crate::memory::{Address, MemoryRange};
use crate::process::{ProcessReader, ThreadContext, ThreadInfo};
use crate::snapshot::memory::MemorySnapshot;
use crate::structure::{RemoteRecord, TargetTraits};

/// Values below this are small integers, not pointers worth following.
const MIN_POINTER: u64 = 0x10000;

#[derive(Debug, Clone)]
pub struct ThreadSnapshot {
    thread_id: u32,
    suspend_count: u32,
    priority_class: u32,
    priority: i32,
    teb_address: Option<Address>,
    context: ThreadContext,
    stack: Option<MemorySnapshot>,
    teb: Option<MemorySnapshot>,
    indirect_memory: Vec<MemorySnapshot>,
}

impl ThreadSnapshot {
    /// Captures the thread's stack and TEB and, when `budget` is given,
    /// memory around values in its registers and on its stack. Every byte
    /// of indirect memory is charged to `budget`.
    pub fn capture<T: TargetTraits>(
        reader: &ProcessReader,
        info: &ThreadInfo,
        config: &SnapshotConfig,
        budget: Option<&mut u32>,
    ) -> Self {
        let mut snapshot = Self {
            thread_id: info.id,
            suspend_count: info.suspend_count,
            priority_class: info.priority_class,
            priority: info.priority,
            teb_address: info.teb.map(|(address, _)| address),
            context: info.context.clone(),
            stack: None,
            teb: None,
            indirect_memory: Vec::new(),
        };

        let teb = info.teb.and_then(|(address, size)| {
            let size = usize::try_from(size).ok()?;
            match RemoteRecord::<T>::read(reader.memory(), address, size) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("thread {}: TEB at {}: {}", info.id, address, e);
                    None
                }
            }
        });
        if let Some((address, size)) = info.teb {
            snapshot.teb = Some(MemorySnapshot::capture(reader.memory(), address, size));
        }

        let stack_region = info.stack_region.or_else(|| {
            let teb = teb.as_ref()?;
            let base = teb.pointer_at(T::TEB.stack_base)?;
            let limit = teb.pointer_at(T::TEB.stack_limit)?;
            (base > limit).then(|| MemoryRange::new(limit, base))
        });
        if let Some(region) = stack_region {
            // Without a usable stack pointer, take the top of the stack.
            let start = if region.contains(info.stack_pointer) {
                info.stack_pointer
            } else {
                Address::new(
                    region
                        .end()
                        .as_u64()
                        .saturating_sub(config.max_stack_bytes)
                        .max(region.start().as_u64()),
                )
            };
            let size = (region.end().as_u64() - start.as_u64()).min(config.max_stack_bytes);
            snapshot.stack = Some(MemorySnapshot::capture(reader.memory(), start, size));
        } else {
            log::debug!("thread {}: stack bounds unknown", info.id);
        }

        if let Some(budget) = budget {
            snapshot.capture_indirect::<T>(reader, stack_region, config.indirect_memory_window, budget);
        }
        snapshot
    }

    fn capture_indirect<T: TargetTraits>(
        &mut self,
        reader: &ProcessReader,
        stack_region: Option<MemoryRange>,
        window: u64,
        budget: &mut u32,
    ) {
        let mut candidates = self.context.registers.clone();
        if let Some(bytes) = self.stack.as_ref().and_then(MemorySnapshot::bytes) {
            candidates.extend(bytes.chunks_exact(T::POINTER_SIZE).map(|word| match T::POINTER_SIZE {
                4 => u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as u64,
                _ => {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(word);
                    u64::from_le_bytes(raw)
                }
            }));
        }

        for value in candidates {
            if *budget == 0 {
                log::debug!("thread {}: indirect memory budget exhausted", self.thread_id);
                break;
            }
            if value < MIN_POINTER {
                continue;
            }
            let Some(range) = reader.memory_map().readable_window(Address::new(value), window) else {
                continue;
            };
            if stack_region.is_some_and(|stack| stack.overlaps(&range)) {
                continue;
            }
            let size = range.size().min(*budget as u64);
            if self
                .indirect_memory
                .iter()
                .any(|m| m.address() == range.start() && m.size() == size)
            {
                continue;
            }
            let captured = MemorySnapshot::capture(reader.memory(), range.start(), size);
            if captured.is_readable() {
                *budget -= size as u32;
            }
            self.indirect_memory.push(captured);
        }
    }

    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }

    pub fn suspend_count(&self) -> u32 {
        self.suspend_count
    }

    pub fn priority_class(&self) -> u32 {
        self.priority_class
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn teb_address(&self) -> Option<Address> {
        self.teb_address
    }

    pub fn context(&self) -> &ThreadContext {
        &self.context
    }

    pub fn stack(&self) -> Option<&MemorySnapshot> {
        self.stack.as_ref()
    }

    pub fn teb(&self) -> Option<&MemorySnapshot> {
        self.teb.as_ref()
    }

    pub fn indirect_memory(&self) -> &[MemorySnapshot] {
        &self.indirect_memory
    }
}
