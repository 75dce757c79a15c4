// Fri Oct 16 2026 - Alex

//! Fake 32- and 64-bit targets laid out in a [`SparseMemory`], with the OS
//! structures the snapshot walks written at their real offsets.

use crate::memory::{Address, MemoryError, MemoryRange, MemoryRegion, PageProtection, SparseMemory};
use crate::process::{
    CpuTimes, HandleInfo, ModuleInfo, ProcessHandle, ProcessInfo, ProcessReader, SuspensionState,
    ThreadContext, ThreadInfo, UnloadTraceLocation,
};
use crate::structure::layout::{
    ANNOTATION_ENTRIES, ANNOTATION_KEY_SIZE, ANNOTATION_VALUE_SIZE, CLIENT_INFO_GATHER_MEMORY_OFFSET,
    CLIENT_INFO_HANDLER_BEHAVIOR_OFFSET, CLIENT_INFO_FORWARDING_OFFSET, CLIENT_INFO_MEMORY_CAP_OFFSET,
    CLIENT_INFO_SIGNATURE, CLIENT_INFO_SIGNATURE_OFFSET, CLIENT_INFO_SIZE_OFFSET, CLIENT_INFO_VERSION, CLIENT_INFO_VERSION_OFFSET,
    EXCEPTION_INFORMATION_POINTERS, EXCEPTION_INFORMATION_SIZE, EXCEPTION_INFORMATION_THREAD_ID,
    RANGE_BAG_ENTRIES, RANGE_BAG_ENTRY_SIZE,
};
use crate::structure::{Bitness, TargetTraits, Traits32, Traits64};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const HEAP_BASE: u64 = 0x0010_0000;

/// Addresses of everything [`FakeProcess::build_peb`] laid out.
#[derive(Debug, Clone)]
pub struct PebFixture {
    pub peb: Address,
    pub peb_size: u64,
    pub ldr: Address,
    pub entries: Vec<Address>,
    /// `(FullDllName, BaseDllName)` buffers per entry, as `(address, byte length)`.
    pub entry_names: Vec<((Address, u64), (Address, u64))>,
    pub process_parameters: Address,
    pub parameter_strings: Vec<(Address, u64)>,
    pub environment: Address,
    pub environment_len: u64,
    pub loader_lock: Address,
    pub loader_lock_debug: Address,
}

#[derive(Debug, Clone)]
pub struct ThreadFixture {
    pub teb: Address,
    pub stack: MemoryRange,
    pub stack_pointer: Address,
}

#[derive(Debug, Clone, Default)]
pub struct ClientInfoFixture {
    pub memory_cap: u32,
    pub handler_behavior: u8,
    pub forwarding: u8,
    pub gather_memory: u8,
    pub ranges: Vec<(u64, u64)>,
    pub annotations: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ExceptionFixture {
    pub information: Address,
    pub pointers: Address,
    pub record: Address,
    pub context: Address,
}

pub struct FakeProcess {
    bitness: Bitness,
    memory: SparseMemory,
    next: u64,
    pub process_id: u32,
    pub parent_process_id: u32,
    peb: Option<(Address, u64)>,
    modules: Vec<ModuleInfo>,
    threads: Vec<ThreadInfo>,
    handles: Vec<HandleInfo>,
    unload_trace: Option<UnloadTraceLocation>,
    unbacked: Vec<MemoryRegion>,
    fail_open: bool,
}

impl FakeProcess {
    pub fn new(bitness: Bitness) -> Self {
        Self {
            bitness,
            memory: SparseMemory::new(),
            next: HEAP_BASE,
            process_id: 4242,
            parent_process_id: 1,
            peb: None,
            modules: Vec::new(),
            threads: Vec::new(),
            handles: Vec::new(),
            unload_trace: None,
            unbacked: Vec::new(),
            fail_open: false,
        }
    }

    pub fn new_32() -> Self {
        Self::new(Bitness::Bits32)
    }

    pub fn new_64() -> Self {
        Self::new(Bitness::Bits64)
    }

    pub fn pointer_size(&self) -> usize {
        self.bitness.pointer_size()
    }

    /// Bump-allocates zeroed, 16-byte aligned memory.
    pub fn alloc(&mut self, size: u64) -> Address {
        let address = Address::new(self.next);
        self.memory.map_zeroed(address, size.max(1));
        self.next = (self.next + size.max(1) + 0xf) & !0xf;
        address
    }

    /// Allocates on fresh pages, leaving an unmapped page before the block.
    pub fn alloc_pages(&mut self, size: u64) -> Address {
        let page = SparseMemory::page_size();
        self.next = ((self.next + page - 1) & !(page - 1)) + page;
        self.alloc(size)
    }

    pub fn write(&mut self, address: Address, bytes: &[u8]) {
        self.memory.write(address, bytes);
    }

    pub fn write_u16(&mut self, address: Address, value: u16) {
        self.memory.write_u16(address, value);
    }

    pub fn write_u32(&mut self, address: Address, value: u32) {
        self.memory.write_u32(address, value);
    }

    pub fn write_u64(&mut self, address: Address, value: u64) {
        self.memory.write_u64(address, value);
    }

    pub fn write_ptr(&mut self, address: Address, value: Address) {
        let size = self.pointer_size();
        self.memory.write_ptr(address, value, size);
    }

    pub fn unmap(&mut self, address: Address, size: u64) {
        self.memory.unmap(address, size);
    }

    /// Reports a readable region in the memory map with nothing behind it,
    /// so reads there fail after the map check passes.
    pub fn map_unbacked(&mut self, address: Address, size: u64) {
        let range = MemoryRange::from_start_size(address, size);
        self.unbacked.push(MemoryRegion::committed(range, PageProtection::READWRITE));
    }

    /// Allocates a UTF-16 buffer for `text` and writes a `UNICODE_STRING`
    /// describing it at `at`. Returns the buffer and its byte length.
    pub fn write_unicode_string(&mut self, at: Address, text: &str) -> (Address, u64) {
        let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let buffer = self.alloc(bytes.len() as u64 + 2);
        self.write(buffer, &bytes);
        let (length, maximum, pointer) = match self.bitness {
            Bitness::Bits32 => (Traits32::UNICODE_STRING.length, Traits32::UNICODE_STRING.maximum_length, Traits32::UNICODE_STRING.buffer),
            Bitness::Bits64 => (Traits64::UNICODE_STRING.length, Traits64::UNICODE_STRING.maximum_length, Traits64::UNICODE_STRING.buffer),
        };
        self.write_u16(at + length as u64, bytes.len() as u16);
        self.write_u16(at + maximum as u64, bytes.len() as u16 + 2);
        self.write_ptr(at + pointer as u64, buffer);
        (buffer, bytes.len() as u64)
    }

    pub fn write_critical_section(&mut self, lock: Address, debug_info: Address) {
        self.write_ptr(lock, debug_info);
    }

    /// Lays out a PEB with loader data listing `names` in the same order on
    /// all three lists, process parameters with every string set, an
    /// environment block and a loader lock with debug info.
    pub fn build_peb(&mut self, names: &[&str]) -> PebFixture {
        match self.bitness {
            Bitness::Bits32 => self.build_peb_with::<Traits32>(names),
            Bitness::Bits64 => self.build_peb_with::<Traits64>(names),
        }
    }

    fn build_peb_with<T: TargetTraits>(&mut self, names: &[&str]) -> PebFixture {
        let ptr = T::POINTER_SIZE as u64;
        let peb = self.alloc(T::PEB.size as u64);
        let ldr = self.alloc(T::LDR_DATA.size as u64);
        self.write_ptr(peb + T::PEB.ldr as u64, ldr);

        let entry_layout = T::LDR_ENTRY;
        let mut entries = Vec::new();
        let mut entry_names = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let entry = self.alloc(entry_layout.size as u64);
            let base = 0x1000_0000 + (i as u64) * 0x10_0000;
            self.write_ptr(entry + entry_layout.dll_base as u64, Address::new(base));
            self.write_u32(entry + entry_layout.size_of_image as u64, 0x8000);
            let full = self.write_unicode_string(
                entry + entry_layout.full_dll_name as u64,
                &format!("C:\\Windows\\System32\\{}", name),
            );
            let short = self.write_unicode_string(entry + entry_layout.base_dll_name as u64, name);
            entries.push(entry);
            entry_names.push((full, short));
        }

        let lists = [
            (T::LDR_DATA.in_load_order, entry_layout.in_load_order_links),
            (T::LDR_DATA.in_memory_order, entry_layout.in_memory_order_links),
            (T::LDR_DATA.in_initialization_order, entry_layout.in_initialization_order_links),
        ];
        for (head_offset, link_offset) in lists {
            let head = ldr + head_offset as u64;
            let link = |entry: &Address| *entry + link_offset as u64;
            let first = entries.first().map(link).unwrap_or(head);
            let last = entries.last().map(link).unwrap_or(head);
            self.write_ptr(head, first);
            self.write_ptr(head + ptr, last);
            for (i, entry) in entries.iter().enumerate() {
                let flink = entries.get(i + 1).map(link).unwrap_or(head);
                let blink = if i == 0 { head } else { link(&entries[i - 1]) };
                self.write_ptr(link(entry), flink);
                self.write_ptr(link(entry) + ptr, blink);
            }
        }

        let layout = T::PROCESS_PARAMETERS;
        let params = self.alloc(layout.size as u64);
        self.write_ptr(peb + T::PEB.process_parameters as u64, params);
        let mut parameter_strings = Vec::new();
        for (field, offset) in layout.string_fields() {
            parameter_strings.push(self.write_unicode_string(params + offset as u64, &format!("{}-value", field)));
        }

        let environment_text = "PATH=C:\\Windows\0TEMP=C:\\Temp\0\0";
        let environment_bytes: Vec<u8> = environment_text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let environment = self.alloc(environment_bytes.len() as u64 + 64);
        self.write(environment, &environment_bytes);
        // Junk after the terminator must not be captured.
        self.write(environment + environment_bytes.len() as u64, &[0x41; 32]);
        self.write_ptr(params + layout.environment as u64, environment);

        let loader_lock = self.alloc(T::CRITICAL_SECTION.size as u64);
        let loader_lock_debug = self.alloc(T::CRITICAL_SECTION.debug_size as u64);
        self.write_critical_section(loader_lock, loader_lock_debug);
        self.write_ptr(peb + T::PEB.loader_lock as u64, loader_lock);

        self.peb = Some((peb, T::PEB.size as u64));
        PebFixture {
            peb,
            peb_size: T::PEB.size as u64,
            ldr,
            entries,
            entry_names,
            process_parameters: params,
            parameter_strings,
            environment,
            environment_len: environment_bytes.len() as u64,
            loader_lock,
            loader_lock_debug,
        }
    }

    pub fn set_peb(&mut self, peb: Option<(Address, u64)>) {
        self.peb = peb;
    }

    pub fn add_module(&mut self, module: ModuleInfo) {
        self.modules.push(module);
    }

    pub fn add_handle(&mut self, handle: HandleInfo) {
        self.handles.push(handle);
    }

    pub fn push_thread(&mut self, thread: ThreadInfo) {
        self.threads.push(thread);
    }

    /// Adds a suspended thread with a TEB and a two-page stack, the stack
    /// pointer halfway down.
    pub fn add_thread(&mut self, id: u32) -> ThreadFixture {
        let (teb_size, stack_base_offset, stack_limit_offset, context_size) = match self.bitness {
            Bitness::Bits32 => (Traits32::TEB.size, Traits32::TEB.stack_base, Traits32::TEB.stack_limit, Traits32::EXCEPTION.context_size),
            Bitness::Bits64 => (Traits64::TEB.size, Traits64::TEB.stack_base, Traits64::TEB.stack_limit, Traits64::EXCEPTION.context_size),
        };
        let stack_start = self.alloc_pages(0x2000);
        let stack = MemoryRange::from_start_size(stack_start, 0x2000);
        let teb = self.alloc_pages(teb_size as u64);
        self.write_ptr(teb + stack_base_offset as u64, stack.end());
        self.write_ptr(teb + stack_limit_offset as u64, stack.start());
        let stack_pointer = stack_start + 0x1000;

        let mut thread = ThreadInfo::new(id);
        thread.suspend_count = 1;
        thread.priority = 8;
        thread.teb = Some((teb, teb_size as u64));
        thread.stack_pointer = stack_pointer;
        thread.context = ThreadContext {
            raw: vec![0u8; context_size],
            registers: vec![stack_pointer.as_u64()],
        };
        self.threads.push(thread);
        ThreadFixture {
            teb,
            stack,
            stack_pointer,
        }
    }

    /// Writes a client info record, its range bag and its annotation
    /// dictionary. Empty `ranges` or `annotations` leave the pointer null.
    pub fn write_client_info(&mut self, info: &ClientInfoFixture) -> Address {
        let (size, ranges_offset, annotations_offset) = match self.bitness {
            Bitness::Bits32 => (Traits32::CLIENT_INFO.size, Traits32::CLIENT_INFO.extra_memory_ranges, Traits32::CLIENT_INFO.simple_annotations),
            Bitness::Bits64 => (Traits64::CLIENT_INFO.size, Traits64::CLIENT_INFO.extra_memory_ranges, Traits64::CLIENT_INFO.simple_annotations),
        };
        let record = self.alloc(size as u64);
        self.write_u32(record + CLIENT_INFO_SIGNATURE_OFFSET as u64, CLIENT_INFO_SIGNATURE);
        self.write_u32(record + CLIENT_INFO_SIZE_OFFSET as u64, size as u32);
        self.write_u32(record + CLIENT_INFO_VERSION_OFFSET as u64, CLIENT_INFO_VERSION);
        self.write_u32(record + CLIENT_INFO_MEMORY_CAP_OFFSET as u64, info.memory_cap);
        self.write(record + CLIENT_INFO_HANDLER_BEHAVIOR_OFFSET as u64, &[info.handler_behavior]);
        self.write(record + CLIENT_INFO_FORWARDING_OFFSET as u64, &[info.forwarding]);
        self.write(record + CLIENT_INFO_GATHER_MEMORY_OFFSET as u64, &[info.gather_memory]);

        if !info.ranges.is_empty() {
            let bag = self.alloc((RANGE_BAG_ENTRIES * RANGE_BAG_ENTRY_SIZE) as u64);
            for (i, (base, len)) in info.ranges.iter().enumerate() {
                let slot = bag + (i * RANGE_BAG_ENTRY_SIZE) as u64;
                self.write_u64(slot, *base);
                self.write_u64(slot + 8, *len);
            }
            self.write_ptr(record + ranges_offset as u64, bag);
        }

        if !info.annotations.is_empty() {
            let entry_size = ANNOTATION_KEY_SIZE + ANNOTATION_VALUE_SIZE;
            let dictionary = self.alloc((ANNOTATION_ENTRIES * entry_size) as u64);
            for (i, (key, value)) in info.annotations.iter().enumerate() {
                let slot = dictionary + (i * entry_size) as u64;
                self.write(slot, key.as_bytes());
                self.write(slot + ANNOTATION_KEY_SIZE as u64, value.as_bytes());
            }
            self.write_ptr(record + annotations_offset as u64, dictionary);
        }
        record
    }

    /// Writes an unload-event ring of `slots` entries, filling the given
    /// `(slot, name, base, size)` ones, and publishes its location.
    /// Returns the ring address.
    pub fn install_unload_ring(&mut self, slots: u32, populated: &[(usize, &str, u64, u64)]) -> Address {
        let (element_size, base_offset, size_offset, stamp_offset, checksum_offset, name_offset) = match self.bitness {
            Bitness::Bits32 => {
                let l = Traits32::UNLOAD_EVENT;
                (l.size, l.base_address, l.size_of_image, l.time_date_stamp, l.check_sum, l.image_name)
            }
            Bitness::Bits64 => {
                let l = Traits64::UNLOAD_EVENT;
                (l.size, l.base_address, l.size_of_image, l.time_date_stamp, l.check_sum, l.image_name)
            }
        };
        let ring = self.alloc(element_size as u64 * slots as u64);
        for (slot, name, base, size) in populated {
            let entry = ring + (*slot * element_size) as u64;
            self.write_ptr(entry + base_offset as u64, Address::new(*base));
            self.write_ptr(entry + size_offset as u64, Address::new(*size));
            self.write_u32(entry + stamp_offset as u64, 0x5f00_0000 + *slot as u32);
            self.write_u32(entry + checksum_offset as u64, 0xc0de_0000 + *slot as u32);
            let name: Vec<u8> = name.encode_utf16().flat_map(u16::to_le_bytes).collect();
            self.write(entry + name_offset as u64, &name);
        }

        let element_size_var = self.alloc(4);
        let element_count_var = self.alloc(4);
        let trace_pointer_var = self.alloc(8);
        self.write_u32(element_size_var, element_size as u32);
        self.write_u32(element_count_var, slots);
        self.write_ptr(trace_pointer_var, ring);
        self.unload_trace = Some(UnloadTraceLocation {
            element_size: element_size_var,
            element_count: element_count_var,
            trace_pointer: trace_pointer_var,
        });
        ring
    }

    pub fn unload_trace(&self) -> Option<UnloadTraceLocation> {
        self.unload_trace
    }

    /// Writes an exception-information record naming `thread_id`, with an
    /// `EXCEPTION_POINTERS` pair, an `EXCEPTION_RECORD` and a context.
    pub fn write_exception(&mut self, thread_id: u32, code: u32, address: Address, parameters: &[u64]) -> ExceptionFixture {
        match self.bitness {
            Bitness::Bits32 => self.write_exception_with::<Traits32>(thread_id, code, address, parameters),
            Bitness::Bits64 => self.write_exception_with::<Traits64>(thread_id, code, address, parameters),
        }
    }

    fn write_exception_with<T: TargetTraits>(&mut self, thread_id: u32, code: u32, address: Address, parameters: &[u64]) -> ExceptionFixture {
        let layout = T::EXCEPTION;
        let record = self.alloc(layout.record_size as u64);
        self.write_u32(record + layout.code as u64, code);
        self.write_u32(record + layout.flags as u64, 1);
        self.write_ptr(record + layout.address as u64, address);
        self.write_u32(record + layout.number_parameters as u64, parameters.len() as u32);
        for (i, value) in parameters.iter().enumerate() {
            let slot = record + (layout.information + i * T::POINTER_SIZE) as u64;
            self.write_ptr(slot, Address::new(*value));
        }

        let context = self.alloc(layout.context_size as u64);
        self.write(context, &[0xcc; 16]);

        let pointers = self.alloc(2 * T::POINTER_SIZE as u64);
        self.write_ptr(pointers, record);
        self.write_ptr(pointers + T::POINTER_SIZE as u64, context);

        let information = self.alloc(EXCEPTION_INFORMATION_SIZE as u64);
        self.write_u32(information + EXCEPTION_INFORMATION_THREAD_ID as u64, thread_id);
        self.write_u64(information + EXCEPTION_INFORMATION_POINTERS as u64, pointers.as_u64());
        ExceptionFixture {
            information,
            pointers,
            record,
            context,
        }
    }

    pub fn fail_open(&mut self) {
        self.fail_open = true;
    }

    pub fn reader(&self) -> ProcessReader {
        self.reader_with(SuspensionState::Suspended)
    }

    pub fn reader_with(&self, state: SuspensionState) -> ProcessReader {
        let memory = Arc::new(self.memory.clone());
        let info = Arc::new(FakeInfo {
            bitness: self.bitness,
            process_id: self.process_id,
            parent_process_id: self.parent_process_id,
            peb: self.peb,
            modules: self.modules.clone(),
            threads: self.threads.clone(),
            handles: self.handles.clone(),
            regions: self.memory.regions().into_iter().chain(self.unbacked.iter().cloned()).collect(),
            unload_trace: self.unload_trace,
        });
        ProcessReader::new(memory, info, state)
    }
}

impl ProcessHandle for FakeProcess {
    fn open(&self, suspension_state: SuspensionState) -> Result<ProcessReader, MemoryError> {
        if self.fail_open {
            return Err(MemoryError::ProcessNotFound(self.process_id.to_string()));
        }
        Ok(self.reader_with(suspension_state))
    }
}

struct FakeInfo {
    bitness: Bitness,
    process_id: u32,
    parent_process_id: u32,
    peb: Option<(Address, u64)>,
    modules: Vec<ModuleInfo>,
    threads: Vec<ThreadInfo>,
    handles: Vec<HandleInfo>,
    regions: Vec<MemoryRegion>,
    unload_trace: Option<UnloadTraceLocation>,
}

impl ProcessInfo for FakeInfo {
    fn process_id(&self) -> u32 {
        self.process_id
    }

    fn parent_process_id(&self) -> u32 {
        self.parent_process_id
    }

    fn is_64bit(&self) -> bool {
        self.bitness.is_64bit()
    }

    fn peb(&self) -> Option<(Address, u64)> {
        self.peb
    }

    fn start_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn cpu_times(&self) -> CpuTimes {
        CpuTimes {
            user: Duration::from_millis(250),
            system: Duration::from_millis(40),
        }
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.clone()
    }

    fn threads(&self) -> Vec<ThreadInfo> {
        self.threads.clone()
    }

    fn handles(&self) -> Vec<HandleInfo> {
        self.handles.clone()
    }

    fn memory_info(&self) -> Vec<MemoryRegion> {
        self.regions.clone()
    }

    fn unload_trace_location(&self) -> Option<UnloadTraceLocation> {
        self.unload_trace
    }

    fn os_version(&self) -> Option<String> {
        Some("10.0.19045".to_string())
    }
}
