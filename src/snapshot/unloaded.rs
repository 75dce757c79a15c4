// Fri Oct 16 2026 - Alex

use crate::memory::{Address, MemoryError, MemoryRange};
use crate::process::ProcessReader;
use crate::snapshot::error::{Result, SnapshotError};
use crate::structure::layout::UNLOAD_EVENT_NAME_BYTES;
use crate::structure::{Bitness, RemoteRecord, TargetTraits};
use serde::{Deserialize, Serialize};

/// Newer systems append fields to each unload event; anything past this
/// multiple of the known size is a corrupt header.
const MAX_ELEMENT_SIZE_FACTOR: usize = 4;

/// One entry of the OS's record of recently unloaded modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadedModuleSnapshot {
    pub base: Address,
    pub size: u64,
    pub checksum: u32,
    pub timestamp: u32,
    pub name: String,
}

/// Reads the unload-event ring in one call and returns its populated slots
/// in ring order.
///
/// The ring's location is published through variables in the reader's own
/// address space, which only line up with the target's when both have the
/// same pointer width. A mismatch is reported, not guessed around.
pub fn read_unloaded_modules<T: TargetTraits>(
    reader: &ProcessReader,
    max_entries: u32,
) -> Result<Vec<UnloadedModuleSnapshot>> {
    let native = Bitness::native();
    if native != T::BITNESS {
        return Err(SnapshotError::BitnessMismatch {
            reader: native,
            target: T::BITNESS,
        });
    }
    let location = reader
        .info()
        .unload_trace_location()
        .ok_or(SnapshotError::Missing {
            what: "unload event trace",
        })?;

    let memory = reader.memory();
    let element_size = memory
        .read_u32(location.element_size)
        .map_err(|e| SnapshotError::unreadable("unload trace element size", location.element_size, e))?
        as usize;
    let element_count = memory
        .read_u32(location.element_count)
        .map_err(|e| SnapshotError::unreadable("unload trace element count", location.element_count, e))?;
    let trace = memory
        .read_ptr(location.trace_pointer, T::POINTER_SIZE)
        .map_err(|e| SnapshotError::unreadable("unload trace pointer", location.trace_pointer, e))?;
    if trace.is_null() || element_count == 0 {
        return Ok(Vec::new());
    }

    let layout = T::UNLOAD_EVENT;
    if element_size < layout.size || element_size > layout.size * MAX_ELEMENT_SIZE_FACTOR {
        return Err(SnapshotError::Truncated {
            what: "unload event",
            address: trace,
        });
    }
    let count = element_count.min(max_entries) as usize;
    if count < element_count as usize {
        log::debug!("unload trace has {} entries, reading {}", element_count, count);
    }

    let len = element_size.checked_mul(count).ok_or(SnapshotError::Truncated {
        what: "unload event trace",
        address: trace,
    })?;
    let range = MemoryRange::checked(trace, len as u64)
        .map_err(|e| SnapshotError::unreadable("unload event trace", trace, e))?;
    if !reader.memory_map().is_range_fully_readable(&range) {
        return Err(SnapshotError::unreadable(
            "unload event trace",
            trace,
            MemoryError::ReadFailed(trace.as_u64()),
        ));
    }
    let ring = RemoteRecord::<T>::read(memory, trace, len)
        .map_err(|e| SnapshotError::unreadable("unload event trace", trace, e))?;

    let mut unloaded = Vec::new();
    for slot in 0..count {
        let at = slot * element_size;
        let Some(name) = ring.utf16_at(at + layout.image_name, UNLOAD_EVENT_NAME_BYTES) else {
            break;
        };
        if name.is_empty() {
            continue;
        }
        unloaded.push(UnloadedModuleSnapshot {
            base: ring.pointer_at(at + layout.base_address).unwrap_or_default(),
            size: ring
                .pointer_at(at + layout.size_of_image)
                .map(|a| a.as_u64())
                .unwrap_or(0),
            checksum: ring.u32_at(at + layout.check_sum).unwrap_or(0),
            timestamp: ring.u32_at(at + layout.time_date_stamp).unwrap_or(0),
            name,
        });
    }
    Ok(unloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::testing::FakeProcess;
    use crate::structure::{Traits32, Traits64};

    fn read_native(fake: &FakeProcess, max: u32) -> Result<Vec<UnloadedModuleSnapshot>> {
        let reader = fake.reader();
        match Bitness::native() {
            Bitness::Bits32 => read_unloaded_modules::<Traits32>(&reader, max),
            Bitness::Bits64 => read_unloaded_modules::<Traits64>(&reader, max),
        }
    }

    fn native_fake() -> FakeProcess {
        FakeProcess::new(Bitness::native())
    }

    #[test]
    fn test_sparse_ring_in_order() {
        let mut fake = native_fake();
        fake.install_unload_ring(
            8,
            &[(5, "late.dll", 0x7ff0_0000, 0x3000), (2, "early.dll", 0x6000_0000, 0x1000)],
        );
        let unloaded = read_native(&fake, 64).unwrap();
        assert_eq!(unloaded.len(), 2);
        assert_eq!(unloaded[0].name, "early.dll");
        assert_eq!(unloaded[0].base, Address::new(0x6000_0000));
        assert_eq!(unloaded[0].size, 0x1000);
        assert_eq!(unloaded[0].timestamp, 0x5f00_0002);
        assert_eq!(unloaded[0].checksum, 0xc0de_0002);
        assert_eq!(unloaded[1].name, "late.dll");
    }

    #[test]
    fn test_entry_cap() {
        let mut fake = native_fake();
        fake.install_unload_ring(8, &[(1, "a.dll", 0x1000, 0x10), (6, "b.dll", 0x2000, 0x10)]);
        let unloaded = read_native(&fake, 4).unwrap();
        assert_eq!(unloaded.len(), 1);
        assert_eq!(unloaded[0].name, "a.dll");
    }

    fn trace_location(fake: &FakeProcess) -> crate::process::UnloadTraceLocation {
        fake.unload_trace().unwrap()
    }

    #[test]
    fn test_oversized_element_size_rejected() {
        let mut fake = native_fake();
        fake.install_unload_ring(64, &[(0, "a.dll", 0x1000, 0x10)]);
        let location = trace_location(&fake);
        fake.write_u32(location.element_size, 0xffff_ffff);
        assert!(matches!(read_native(&fake, 64), Err(SnapshotError::Truncated { .. })));
    }

    #[test]
    fn test_undersized_element_size_rejected() {
        let mut fake = native_fake();
        fake.install_unload_ring(8, &[(0, "a.dll", 0x1000, 0x10)]);
        let location = trace_location(&fake);
        fake.write_u32(location.element_size, 8);
        assert!(matches!(read_native(&fake, 64), Err(SnapshotError::Truncated { .. })));
    }

    #[test]
    fn test_huge_count_past_short_ring() {
        let mut fake = native_fake();
        fake.install_unload_ring(8, &[(0, "a.dll", 0x1000, 0x10)]);
        let location = trace_location(&fake);
        fake.write_u32(location.element_count, u32::MAX);
        // Capped at 64 slots, which runs past the mapped ring.
        assert!(matches!(read_native(&fake, 64), Err(SnapshotError::Unreadable { .. })));
    }

    #[test]
    fn test_huge_count_is_capped() {
        let mut fake = native_fake();
        fake.install_unload_ring(16, &[(15, "last.dll", 0x1000, 0x10)]);
        let location = trace_location(&fake);
        fake.write_u32(location.element_count, u32::MAX);
        let unloaded = read_native(&fake, 16).unwrap();
        assert_eq!(unloaded.len(), 1);
        assert_eq!(unloaded[0].name, "last.dll");
    }

    #[test]
    fn test_trace_pointer_into_unmapped_memory() {
        let mut fake = native_fake();
        fake.install_unload_ring(8, &[(0, "a.dll", 0x1000, 0x10)]);
        let location = trace_location(&fake);
        fake.write_ptr(location.trace_pointer, Address::new(0x7000_0000));
        assert!(matches!(read_native(&fake, 64), Err(SnapshotError::Unreadable { .. })));
    }

    #[test]
    fn test_missing_location() {
        let fake = native_fake();
        assert!(matches!(read_native(&fake, 64), Err(SnapshotError::Missing { .. })));
    }

    #[test]
    fn test_cross_bitness_is_skipped() {
        let fake = FakeProcess::new_32();
        let reader = fake.reader();
        let result = match Bitness::native() {
            Bitness::Bits64 => read_unloaded_modules::<Traits32>(&reader, 64),
            Bitness::Bits32 => read_unloaded_modules::<Traits64>(&reader, 64),
        };
        assert!(matches!(result, Err(SnapshotError::BitnessMismatch { .. })));
    }
}
