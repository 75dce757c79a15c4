// Sun Oct 18 2026 - Alex

use crate::config::SnapshotConfig;
use crate::memory::{Address, MemoryMap};
use crate::process::{CpuTimes, ProcessHandle, ProcessReader, SuspensionState};
use crate::snapshot::critical_section::capture_critical_section;
use crate::snapshot::error::{Result, SnapshotError};
use crate::snapshot::exception::ExceptionSnapshot;
use crate::snapshot::handle::HandleSnapshot;
use crate::snapshot::loader::LoaderDataWalker;
use crate::snapshot::memory::ExtraMemory;
use crate::snapshot::module::ModuleSnapshot;
use crate::snapshot::options::{self, CrashpadOptions};
use crate::snapshot::state::InitializationState;
use crate::snapshot::system::SystemSnapshot;
use crate::snapshot::thread::ThreadSnapshot;
use crate::snapshot::unloaded::{read_unloaded_modules, UnloadedModuleSnapshot};
use crate::structure::{Bitness, TargetTraits, Traits32, Traits64};
use crate::utils::logging::ScopedTimer;
use std::collections::BTreeMap;
use std::time::SystemTime;
use uuid::Uuid;

/// Everything a minidump writer needs from one process, captured in a single
/// pass and read-only afterwards.
///
/// Only opening the process can fail [`initialize`](Self::initialize). Every
/// later section is best-effort: a damaged structure in the target is logged
/// and leaves that section empty or partial.
pub struct ProcessSnapshot {
    state: InitializationState,
    config: SnapshotConfig,
    process_id: u32,
    parent_process_id: u32,
    snapshot_time: SystemTime,
    process_start_time: SystemTime,
    process_cpu_times: CpuTimes,
    report_id: Uuid,
    client_id: Uuid,
    annotations_simple_map: BTreeMap<String, String>,
    system: SystemSnapshot,
    threads: Vec<ThreadSnapshot>,
    modules: Vec<ModuleSnapshot>,
    unloaded_modules: Vec<UnloadedModuleSnapshot>,
    exception: Option<ExceptionSnapshot>,
    memory_map: MemoryMap,
    handles: Vec<HandleSnapshot>,
    extra_memory: ExtraMemory,
    crashpad_options: CrashpadOptions,
}

impl Default for ProcessSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSnapshot {
    pub fn new() -> Self {
        Self::with_config(SnapshotConfig::default())
    }

    pub fn with_config(config: SnapshotConfig) -> Self {
        Self {
            state: InitializationState::new(),
            config,
            process_id: 0,
            parent_process_id: 0,
            snapshot_time: SystemTime::UNIX_EPOCH,
            process_start_time: SystemTime::UNIX_EPOCH,
            process_cpu_times: CpuTimes::default(),
            report_id: Uuid::nil(),
            client_id: Uuid::nil(),
            annotations_simple_map: BTreeMap::new(),
            system: SystemSnapshot::default(),
            threads: Vec::new(),
            modules: Vec::new(),
            unloaded_modules: Vec::new(),
            exception: None,
            memory_map: MemoryMap::default(),
            handles: Vec::new(),
            extra_memory: ExtraMemory::default(),
            crashpad_options: CrashpadOptions::default(),
        }
    }

    /// Captures the process behind `process`.
    ///
    /// Panics if called twice on the same snapshot.
    pub fn initialize(
        &mut self,
        process: &dyn ProcessHandle,
        suspension_state: SuspensionState,
        exception_information_address: Option<Address>,
        debug_critical_section_address: Option<Address>,
    ) -> Result<()> {
        self.state.begin();
        let _timer = ScopedTimer::new("process snapshot");
        self.snapshot_time = SystemTime::now();

        let reader = match process.open(suspension_state) {
            Ok(reader) => reader,
            Err(e) => {
                self.state.set_invalid();
                return Err(SnapshotError::OpenFailed(e));
            }
        };
        log::debug!(
            "snapshotting pid {} ({}, {:?})",
            reader.info().process_id(),
            reader.bitness(),
            suspension_state
        );

        match reader.bitness() {
            Bitness::Bits32 => self.capture::<Traits32>(
                &reader,
                exception_information_address,
                debug_critical_section_address,
            ),
            Bitness::Bits64 => self.capture::<Traits64>(
                &reader,
                exception_information_address,
                debug_critical_section_address,
            ),
        }

        self.state.set_valid();
        Ok(())
    }

    fn capture<T: TargetTraits>(
        &mut self,
        reader: &ProcessReader,
        exception_information_address: Option<Address>,
        debug_critical_section_address: Option<Address>,
    ) {
        let info = reader.info();
        self.process_id = info.process_id();
        self.parent_process_id = info.parent_process_id();
        self.process_start_time = info.start_time();
        self.process_cpu_times = info.cpu_times();
        self.extra_memory = ExtraMemory::with_limit(self.config.max_extra_memory_bytes);

        if let Some(address) = exception_information_address {
            let _timer = ScopedTimer::new("exception");
            match ExceptionSnapshot::capture::<T>(reader, address) {
                Ok(exception) => self.exception = Some(exception),
                Err(e) => log::warn!("exception: {}", e),
            }
        }

        self.system = SystemSnapshot::capture(reader);

        match info.peb() {
            Some((peb, size)) => {
                let _timer = ScopedTimer::new("loader data");
                let result = LoaderDataWalker::<T>::new(reader, &mut self.extra_memory)
                    .with_node_cap(self.config.loader_list_node_cap)
                    .with_environment_max_units(self.config.environment_block_max_units)
                    .walk(peb, size);
                if let Err(e) = result {
                    log::warn!("loader data: {}", e);
                }
            }
            None => log::info!("target has no PEB, skipping loader data"),
        }

        if let Some(address) = debug_critical_section_address {
            if let Err(e) = capture_critical_section::<T>(reader, &mut self.extra_memory, address) {
                log::warn!("debug critical section: {}", e);
            }
        }

        {
            let _timer = ScopedTimer::new("modules");
            self.modules = info
                .modules()
                .iter()
                .map(|module| ModuleSnapshot::capture::<T>(reader, module))
                .collect();
        }

        match read_unloaded_modules::<T>(reader, self.config.unloaded_module_max_entries) {
            Ok(unloaded) => self.unloaded_modules = unloaded,
            Err(e @ SnapshotError::BitnessMismatch { .. }) => log::info!("unloaded modules: {}", e),
            Err(e @ SnapshotError::Missing { .. }) => log::debug!("unloaded modules: {}", e),
            Err(e) => log::warn!("unloaded modules: {}", e),
        }

        self.crashpad_options = options::aggregate(self.modules.iter().map(ModuleSnapshot::crashpad_options));

        {
            let _timer = ScopedTimer::new("threads");
            let mut budget = self.crashpad_options.memory_budget();
            self.threads = reader
                .threads()
                .iter()
                .map(|thread| ThreadSnapshot::capture::<T>(reader, thread, &self.config, budget.as_mut()))
                .collect();
            if let Some(remaining) = budget {
                log::debug!("indirect memory budget left: {} bytes", remaining);
            }
        }

        self.memory_map = reader.memory_map().clone();
        if self.config.capture_handles {
            self.handles = info.handles().iter().map(HandleSnapshot::from).collect();
        }

        for module in &self.modules {
            for range in module.extra_memory_ranges() {
                self.extra_memory.record(reader, range.start(), range.size());
            }
        }
        log::debug!(
            "{} threads, {} modules, {} extra memory ranges (0x{:x} bytes)",
            self.threads.len(),
            self.modules.len(),
            self.extra_memory.len(),
            self.extra_memory.total_bytes()
        );
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    pub fn process_id(&self) -> u32 {
        self.state.assert_valid();
        self.process_id
    }

    pub fn parent_process_id(&self) -> u32 {
        self.state.assert_valid();
        self.parent_process_id
    }

    pub fn snapshot_time(&self) -> SystemTime {
        self.state.assert_valid();
        self.snapshot_time
    }

    pub fn process_start_time(&self) -> SystemTime {
        self.state.assert_valid();
        self.process_start_time
    }

    pub fn process_cpu_times(&self) -> CpuTimes {
        self.state.assert_valid();
        self.process_cpu_times
    }

    pub fn set_report_id(&mut self, report_id: Uuid) {
        self.report_id = report_id;
    }

    pub fn report_id(&self) -> Uuid {
        self.state.assert_valid();
        self.report_id
    }

    pub fn set_client_id(&mut self, client_id: Uuid) {
        self.client_id = client_id;
    }

    pub fn client_id(&self) -> Uuid {
        self.state.assert_valid();
        self.client_id
    }

    pub fn set_annotations_simple_map(&mut self, annotations: BTreeMap<String, String>) {
        self.annotations_simple_map = annotations;
    }

    pub fn annotations_simple_map(&self) -> &BTreeMap<String, String> {
        self.state.assert_valid();
        &self.annotations_simple_map
    }

    pub fn system(&self) -> &SystemSnapshot {
        self.state.assert_valid();
        &self.system
    }

    pub fn threads(&self) -> &[ThreadSnapshot] {
        self.state.assert_valid();
        &self.threads
    }

    pub fn modules(&self) -> &[ModuleSnapshot] {
        self.state.assert_valid();
        &self.modules
    }

    pub fn unloaded_modules(&self) -> &[UnloadedModuleSnapshot] {
        self.state.assert_valid();
        &self.unloaded_modules
    }

    pub fn exception(&self) -> Option<&ExceptionSnapshot> {
        self.state.assert_valid();
        self.exception.as_ref()
    }

    pub fn memory_map(&self) -> &MemoryMap {
        self.state.assert_valid();
        &self.memory_map
    }

    pub fn handles(&self) -> &[HandleSnapshot] {
        self.state.assert_valid();
        &self.handles
    }

    pub fn extra_memory(&self) -> &ExtraMemory {
        self.state.assert_valid();
        &self.extra_memory
    }

    pub fn crashpad_options(&self) -> &CrashpadOptions {
        self.state.assert_valid();
        &self.crashpad_options
    }
}
