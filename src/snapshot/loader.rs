// Thu Oct 15 2026 - Alex

use crate::memory::Address;
use crate::process::ProcessReader;
use crate::snapshot::critical_section::capture_critical_section;
use crate::snapshot::error::{Result, SnapshotError};
use crate::snapshot::memory::ExtraMemory;
use crate::structure::{ListEntry, RemoteRecord, TargetTraits, UnicodeString};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Captures the loader bookkeeping reachable from the PEB into the extra
/// memory pool: the PEB itself, `PEB_LDR_DATA`, every node of the three module
/// lists with its two name buffers, the process parameters with their strings
/// and environment block, and the loader lock.
pub struct LoaderDataWalker<'a, T: TargetTraits> {
    reader: &'a ProcessReader,
    pool: &'a mut ExtraMemory,
    node_cap: usize,
    environment_max_units: usize,
    _traits: PhantomData<T>,
}

impl<'a, T: TargetTraits> LoaderDataWalker<'a, T> {
    pub fn new(reader: &'a ProcessReader, pool: &'a mut ExtraMemory) -> Self {
        Self {
            reader,
            pool,
            node_cap: 1024,
            environment_max_units: 32768,
            _traits: PhantomData,
        }
    }

    pub fn with_node_cap(mut self, node_cap: usize) -> Self {
        self.node_cap = node_cap;
        self
    }

    pub fn with_environment_max_units(mut self, units: usize) -> Self {
        self.environment_max_units = units;
        self
    }

    /// Fails only if the PEB itself cannot be read. Everything past that is
    /// captured best-effort, each piece independently of the others.
    pub fn walk(&mut self, peb_address: Address, peb_size: u64) -> Result<()> {
        let peb = RemoteRecord::<T>::read(self.reader.memory(), peb_address, T::PEB.size)
            .map_err(|e| SnapshotError::unreadable("PEB", peb_address, e))?;
        let recorded_size = if peb_size == 0 { T::PEB.size as u64 } else { peb_size };
        self.record(peb_address, recorded_size);

        match peb.pointer_at(T::PEB.ldr) {
            Some(ldr) if !ldr.is_null() => {
                if let Err(e) = self.walk_loader_data(ldr) {
                    log::warn!("loader data: {}", e);
                }
            }
            _ => log::warn!("PEB at {} has no loader data", peb_address),
        }

        match peb.pointer_at(T::PEB.process_parameters) {
            Some(params) if !params.is_null() => {
                if let Err(e) = self.walk_process_parameters(params) {
                    log::warn!("process parameters: {}", e);
                }
            }
            _ => log::warn!("PEB at {} has no process parameters", peb_address),
        }

        if let Some(lock) = peb.pointer_at(T::PEB.loader_lock).filter(|a| !a.is_null()) {
            if let Err(e) = capture_critical_section::<T>(self.reader, self.pool, lock) {
                log::warn!("loader lock: {}", e);
            }
        }
        Ok(())
    }

    fn walk_loader_data(&mut self, ldr_address: Address) -> Result<()> {
        let layout = T::LDR_DATA;
        let ldr = RemoteRecord::<T>::read(self.reader.memory(), ldr_address, layout.size)
            .map_err(|e| SnapshotError::unreadable("PEB_LDR_DATA", ldr_address, e))?;
        self.record(ldr_address, layout.size as u64);

        let entry = T::LDR_ENTRY;
        let lists = [
            ("InLoadOrderModuleList", layout.in_load_order, entry.in_load_order_links),
            ("InMemoryOrderModuleList", layout.in_memory_order, entry.in_memory_order_links),
            (
                "InInitializationOrderModuleList",
                layout.in_initialization_order,
                entry.in_initialization_order_links,
            ),
        ];
        for (name, head_offset, link_offset) in lists {
            let Some(head) = ldr.list_entry_at(head_offset) else {
                continue;
            };
            let head_address = ldr_address + head_offset as u64;
            match self.walk_module_list(head_address, head, link_offset) {
                Ok(count) => log::debug!("{}: {} entries", name, count),
                Err(e) => log::warn!("{}: {}", name, e),
            }
        }
        Ok(())
    }

    /// Walks one circular list of `LDR_DATA_TABLE_ENTRY` records, where each
    /// link points at the `LIST_ENTRY` embedded at `link_offset` inside the
    /// next record.
    ///
    /// The list is untrusted. The walk ends after capturing the node the head
    /// names as its tail, and also on a null link, on a link back to the head,
    /// on revisiting a node, or once `node_cap` nodes have been captured.
    /// Returns the number of nodes captured.
    pub fn walk_module_list(
        &mut self,
        head_address: Address,
        head: ListEntry,
        link_offset: usize,
    ) -> Result<usize> {
        let layout = T::LDR_ENTRY;
        let tail = head.blink;
        let mut current = head.flink;
        let mut visited = HashSet::new();
        let mut captured = 0usize;

        while !current.is_null() && current != head_address {
            if !visited.insert(current) {
                log::debug!("loader list at {} revisits {}", head_address, current);
                break;
            }
            if captured >= self.node_cap {
                return Err(SnapshotError::NodeCapExceeded {
                    head: head_address,
                    cap: self.node_cap,
                });
            }
            let Some(entry_address) = current.checked_sub(link_offset as u64) else {
                break;
            };
            let entry = RemoteRecord::<T>::read(self.reader.memory(), entry_address, layout.size)
                .map_err(|e| SnapshotError::unreadable("LDR_DATA_TABLE_ENTRY", entry_address, e))?;
            self.record(entry_address, layout.size as u64);
            self.record_unicode_string(entry.unicode_string_at(layout.full_dll_name));
            self.record_unicode_string(entry.unicode_string_at(layout.base_dll_name));
            captured += 1;

            if current == tail {
                break;
            }
            match entry.list_entry_at(link_offset) {
                Some(links) => current = links.flink,
                None => break,
            }
        }
        Ok(captured)
    }

    fn walk_process_parameters(&mut self, address: Address) -> Result<()> {
        let layout = T::PROCESS_PARAMETERS;
        let params = RemoteRecord::<T>::read(self.reader.memory(), address, layout.size)
            .map_err(|e| SnapshotError::unreadable("RTL_USER_PROCESS_PARAMETERS", address, e))?;
        self.record(address, layout.size as u64);

        for (name, offset) in layout.string_fields() {
            let string = params.unicode_string_at(offset);
            if string.is_none() {
                log::debug!("process parameters: {} truncated", name);
            }
            self.record_unicode_string(string);
        }

        if let Some(environment) = params.pointer_at(layout.environment).filter(|a| !a.is_null()) {
            self.capture_environment(environment);
        }
        Ok(())
    }

    /// The environment block has no recorded length; read up to the ceiling
    /// and keep everything through the first double-NUL terminator.
    fn capture_environment(&mut self, address: Address) {
        let max_bytes = self.environment_max_units.saturating_mul(2);
        match self.reader.memory().read_available(address, max_bytes) {
            Ok(bytes) => {
                let len = environment_block_len(&bytes);
                self.record(address, len as u64);
            }
            Err(e) => log::warn!("environment block at {}: {}", address, e),
        }
    }

    fn record_unicode_string(&mut self, string: Option<UnicodeString>) {
        if let Some(us) = string.filter(|us| us.length > 0) {
            self.record(us.buffer, us.length as u64);
        }
    }

    fn record(&mut self, address: Address, size: u64) {
        self.pool.record(self.reader, address, size);
    }
}

/// Byte length of a UTF-16 environment block including its double-NUL
/// terminator, or the whole even-length prefix if no terminator was read.
pub fn environment_block_len(bytes: &[u8]) -> usize {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    units
        .windows(2)
        .position(|w| w == [0, 0])
        .map(|at| (at + 2) * 2)
        .unwrap_or(units.len() * 2)
}
