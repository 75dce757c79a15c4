// Fri Oct 16 2026 - Alex

use crate::memory::{Address, MemoryRange};
use crate::process::{ModuleInfo, ProcessReader};
use crate::snapshot::error::{Result, SnapshotError};
use crate::snapshot::options::{CrashpadOptions, TriState};
use crate::structure::layout::{
    ANNOTATION_ENTRIES, ANNOTATION_KEY_SIZE, ANNOTATION_VALUE_SIZE, CLIENT_INFO_FORWARDING_OFFSET,
    CLIENT_INFO_GATHER_MEMORY_OFFSET, CLIENT_INFO_HANDLER_BEHAVIOR_OFFSET,
    CLIENT_INFO_MEMORY_CAP_OFFSET, CLIENT_INFO_SIGNATURE, CLIENT_INFO_SIGNATURE_OFFSET,
    CLIENT_INFO_SIZE_OFFSET, CLIENT_INFO_VERSION, CLIENT_INFO_VERSION_OFFSET, RANGE_BAG_ENTRIES,
    RANGE_BAG_ENTRY_SIZE,
};
use crate::structure::record::decode_c_string;
use crate::structure::{RemoteRecord, TargetTraits};
use std::collections::BTreeMap;

/// A loaded module plus whatever its client info record says about crash
/// policy, extra memory and annotations.
#[derive(Debug, Clone)]
pub struct ModuleSnapshot {
    name: String,
    base: Address,
    size: u64,
    timestamp: u32,
    checksum: u32,
    crashpad_options: CrashpadOptions,
    extra_memory_ranges: Vec<MemoryRange>,
    annotations_simple_map: BTreeMap<String, String>,
}

impl ModuleSnapshot {
    /// Never fails: a missing or damaged client info record only leaves the
    /// module without options, ranges or annotations.
    pub fn capture<T: TargetTraits>(reader: &ProcessReader, info: &ModuleInfo) -> Self {
        let mut module = Self {
            name: info.name.clone(),
            base: info.base,
            size: info.size,
            timestamp: info.timestamp,
            checksum: info.checksum,
            crashpad_options: CrashpadOptions::default(),
            extra_memory_ranges: Vec::new(),
            annotations_simple_map: BTreeMap::new(),
        };
        if let Some(address) = info.client_info.filter(|a| !a.is_null()) {
            if let Err(e) = module.read_client_info::<T>(reader, address) {
                log::warn!("{}: client info: {}", module.name, e);
            }
        }
        module
    }

    fn read_client_info<T: TargetTraits>(&mut self, reader: &ProcessReader, address: Address) -> Result<()> {
        let layout = T::CLIENT_INFO;
        let record = RemoteRecord::<T>::read(reader.memory(), address, layout.size)
            .map_err(|e| SnapshotError::unreadable("client info", address, e))?;
        let truncated = || SnapshotError::Truncated {
            what: "client info",
            address,
        };

        let signature = record.u32_at(CLIENT_INFO_SIGNATURE_OFFSET).ok_or_else(truncated)?;
        if signature != CLIENT_INFO_SIGNATURE {
            return Err(SnapshotError::BadSignature {
                address,
                found: signature,
            });
        }
        let size = record.u32_at(CLIENT_INFO_SIZE_OFFSET).ok_or_else(truncated)?;
        let version = record.u32_at(CLIENT_INFO_VERSION_OFFSET).ok_or_else(truncated)?;
        if (size as usize) < layout.size || version < CLIENT_INFO_VERSION {
            return Err(truncated());
        }

        let byte = |offset| record.u8_at(offset).map(TriState::from_byte).unwrap_or_default();
        self.crashpad_options = CrashpadOptions {
            crashpad_handler_behavior: byte(CLIENT_INFO_HANDLER_BEHAVIOR_OFFSET),
            system_crash_reporter_forwarding: byte(CLIENT_INFO_FORWARDING_OFFSET),
            gather_indirectly_referenced_memory: byte(CLIENT_INFO_GATHER_MEMORY_OFFSET),
            indirectly_referenced_memory_cap: record.u32_at(CLIENT_INFO_MEMORY_CAP_OFFSET).unwrap_or(0),
        };

        if let Some(bag) = record.pointer_at(layout.extra_memory_ranges).filter(|a| !a.is_null()) {
            match read_range_bag::<T>(reader, bag) {
                Ok(ranges) => self.extra_memory_ranges = ranges,
                Err(e) => log::warn!("{}: extra memory ranges: {}", self.name, e),
            }
        }
        if let Some(dictionary) = record.pointer_at(layout.simple_annotations).filter(|a| !a.is_null()) {
            match read_annotations::<T>(reader, dictionary) {
                Ok(map) => self.annotations_simple_map = map,
                Err(e) => log::warn!("{}: annotations: {}", self.name, e),
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn crashpad_options(&self) -> &CrashpadOptions {
        &self.crashpad_options
    }

    pub fn extra_memory_ranges(&self) -> &[MemoryRange] {
        &self.extra_memory_ranges
    }

    pub fn annotations_simple_map(&self) -> &BTreeMap<String, String> {
        &self.annotations_simple_map
    }
}

fn read_range_bag<T: TargetTraits>(reader: &ProcessReader, address: Address) -> Result<Vec<MemoryRange>> {
    let bag = RemoteRecord::<T>::read(reader.memory(), address, RANGE_BAG_ENTRIES * RANGE_BAG_ENTRY_SIZE)
        .map_err(|e| SnapshotError::unreadable("range bag", address, e))?;
    let mut ranges = Vec::new();
    for slot in 0..RANGE_BAG_ENTRIES {
        let at = slot * RANGE_BAG_ENTRY_SIZE;
        let (Some(base), Some(size)) = (bag.u64_at(at), bag.u64_at(at + 8)) else {
            break;
        };
        if size == 0 {
            continue;
        }
        match MemoryRange::checked(Address::new(base), size) {
            Ok(range) => ranges.push(range),
            Err(e) => log::debug!("range bag slot {}: {}", slot, e),
        }
    }
    Ok(ranges)
}

fn read_annotations<T: TargetTraits>(
    reader: &ProcessReader,
    address: Address,
) -> Result<BTreeMap<String, String>> {
    let entry_size = ANNOTATION_KEY_SIZE + ANNOTATION_VALUE_SIZE;
    let dictionary = RemoteRecord::<T>::read(reader.memory(), address, ANNOTATION_ENTRIES * entry_size)
        .map_err(|e| SnapshotError::unreadable("annotation dictionary", address, e))?;
    let mut map = BTreeMap::new();
    for slot in 0..ANNOTATION_ENTRIES {
        let at = slot * entry_size;
        let (Some(key), Some(value)) = (
            dictionary.slice(at, ANNOTATION_KEY_SIZE),
            dictionary.slice(at + ANNOTATION_KEY_SIZE, ANNOTATION_VALUE_SIZE),
        ) else {
            break;
        };
        let key = decode_c_string(key);
        if key.is_empty() {
            continue;
        }
        map.insert(key, decode_c_string(value));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::testing::{ClientInfoFixture, FakeProcess};
    use crate::structure::{Traits32, Traits64};

    #[test]
    fn test_module_without_client_info() {
        let fake = FakeProcess::new_64();
        let reader = fake.reader();
        let info = ModuleInfo::new("app.exe", Address::new(0x40_0000), 0x2_0000).with_image_stamp(0x5eed, 0xabc);
        let module = ModuleSnapshot::capture::<Traits64>(&reader, &info);
        assert_eq!(module.name(), "app.exe");
        assert_eq!(module.timestamp(), 0x5eed);
        assert_eq!(module.checksum(), 0xabc);
        assert_eq!(*module.crashpad_options(), CrashpadOptions::default());
        assert!(module.extra_memory_ranges().is_empty());
    }

    #[test]
    fn test_client_info_is_parsed() {
        let mut fake = FakeProcess::new_64();
        let record = fake.write_client_info(&ClientInfoFixture {
            memory_cap: 0x4000,
            handler_behavior: 1,
            forwarding: 2,
            gather_memory: 1,
            ranges: vec![(0x1000, 0x20), (0, 0), (0x9000, 0x10)],
            annotations: vec![("channel".to_string(), "beta".to_string())],
        });
        let reader = fake.reader();
        let info = ModuleInfo::new("app.exe", Address::new(0x40_0000), 0x2_0000).with_client_info(record);
        let module = ModuleSnapshot::capture::<Traits64>(&reader, &info);

        let options = module.crashpad_options();
        assert_eq!(options.crashpad_handler_behavior, TriState::Enabled);
        assert_eq!(options.system_crash_reporter_forwarding, TriState::Disabled);
        assert_eq!(options.memory_budget(), Some(0x4000));
        assert_eq!(
            module.extra_memory_ranges(),
            &[
                MemoryRange::from_start_size(Address::new(0x1000), 0x20),
                MemoryRange::from_start_size(Address::new(0x9000), 0x10),
            ]
        );
        assert_eq!(module.annotations_simple_map().get("channel").map(String::as_str), Some("beta"));
    }

    #[test]
    fn test_client_info_32bit_pointers() {
        let mut fake = FakeProcess::new_32();
        let record = fake.write_client_info(&ClientInfoFixture {
            ranges: vec![(0x2000, 0x8)],
            annotations: vec![("k".to_string(), "v".to_string())],
            ..Default::default()
        });
        let reader = fake.reader();
        let info = ModuleInfo::new("app.exe", Address::new(0x40_0000), 0x1000).with_client_info(record);
        let module = ModuleSnapshot::capture::<Traits32>(&reader, &info);
        assert_eq!(module.extra_memory_ranges().len(), 1);
        assert_eq!(module.annotations_simple_map().len(), 1);
    }

    #[test]
    fn test_bad_signature_leaves_defaults() {
        let mut fake = FakeProcess::new_64();
        let record = fake.write_client_info(&ClientInfoFixture {
            handler_behavior: 1,
            ranges: vec![(0x1000, 0x20)],
            ..Default::default()
        });
        fake.write_u32(record, 0x1234_5678);
        let reader = fake.reader();
        let info = ModuleInfo::new("app.exe", Address::new(0x40_0000), 0x1000).with_client_info(record);
        let module = ModuleSnapshot::capture::<Traits64>(&reader, &info);
        assert_eq!(*module.crashpad_options(), CrashpadOptions::default());
        assert!(module.extra_memory_ranges().is_empty());
    }

    #[test]
    fn test_unreadable_client_info() {
        let fake = FakeProcess::new_64();
        let reader = fake.reader();
        let info = ModuleInfo::new("app.exe", Address::new(0x40_0000), 0x1000).with_client_info(Address::new(0x80));
        let module = ModuleSnapshot::capture::<Traits64>(&reader, &info);
        assert_eq!(*module.crashpad_options(), CrashpadOptions::default());
    }
}
