// Thu Oct 15 2026 - Alex

use crate::memory::Address;
use crate::process::ProcessReader;
use crate::snapshot::error::{Result, SnapshotError};
use crate::snapshot::memory::ExtraMemory;
use crate::structure::{RemoteRecord, TargetTraits};

/// Records one `RTL_CRITICAL_SECTION` and, unless its `DebugInfo` is the
/// all-ones sentinel, the `RTL_CRITICAL_SECTION_DEBUG` it points at.
///
/// Only the lock at `address` is captured. The process-wide list threaded
/// through the debug records is left alone.
pub fn capture_critical_section<T: TargetTraits>(
    reader: &ProcessReader,
    pool: &mut ExtraMemory,
    address: Address,
) -> Result<()> {
    let layout = T::CRITICAL_SECTION;
    let lock = RemoteRecord::<T>::read(reader.memory(), address, layout.size)
        .map_err(|e| SnapshotError::unreadable("critical section", address, e))?;
    pool.record(reader, address, layout.size as u64);

    let debug_info = lock
        .pointer_at(layout.debug_info)
        .ok_or(SnapshotError::Truncated {
            what: "critical section",
            address,
        })?;
    if debug_info.as_u64() == T::invalid_pointer() {
        return Ok(());
    }
    pool.record(reader, debug_info, layout.debug_size as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::testing::FakeProcess;
    use crate::structure::{Traits32, Traits64};

    #[test]
    fn test_lock_with_debug_info() {
        let mut fake = FakeProcess::new_64();
        let lock = fake.alloc(Traits64::CRITICAL_SECTION.size as u64);
        let debug = fake.alloc(Traits64::CRITICAL_SECTION.debug_size as u64);
        fake.write_critical_section(lock, debug);
        let reader = fake.reader();

        let mut pool = ExtraMemory::default();
        capture_critical_section::<Traits64>(&reader, &mut pool, lock).unwrap();
        assert!(pool.contains(lock, 0x28));
        assert!(pool.contains(debug, 0x30));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_invalid_debug_info_sentinel() {
        let mut fake = FakeProcess::new_32();
        let lock = fake.alloc(Traits32::CRITICAL_SECTION.size as u64);
        fake.write_critical_section(lock, Address::new(0xffff_ffff));
        let reader = fake.reader();

        let mut pool = ExtraMemory::default();
        capture_critical_section::<Traits32>(&reader, &mut pool, lock).unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(lock, 0x18));
    }

    #[test]
    fn test_unreadable_lock_is_an_error() {
        let fake = FakeProcess::new_64();
        let reader = fake.reader();
        let mut pool = ExtraMemory::default();
        let result = capture_critical_section::<Traits64>(&reader, &mut pool, Address::new(0x40));
        assert!(matches!(result, Err(SnapshotError::Unreadable { .. })));
        assert!(pool.is_empty());
    }
}
