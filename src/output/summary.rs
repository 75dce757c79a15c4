// Sun Oct 18 2026 - Alex

use crate::snapshot::{
    CrashpadOptions, HandleSnapshot, ProcessSnapshot, SystemSnapshot, UnloadedModuleSnapshot,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A serializable digest of a [`ProcessSnapshot`]. Addresses are rendered as
/// hex strings and captured bytes are left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub process_id: u32,
    pub parent_process_id: u32,
    pub snapshot_time: u64,
    pub process_start_time: u64,
    pub user_cpu_ms: u128,
    pub system_cpu_ms: u128,
    pub report_id: Uuid,
    pub client_id: Uuid,
    pub annotations: BTreeMap<String, String>,
    pub system: SystemSnapshot,
    pub crashpad_options: CrashpadOptions,
    pub exception: Option<ExceptionSummary>,
    pub threads: Vec<ThreadSummary>,
    pub modules: Vec<ModuleSummary>,
    pub unloaded_modules: Vec<UnloadedModuleSnapshot>,
    pub handles: Vec<HandleSnapshot>,
    pub memory_regions: usize,
    pub extra_memory: Vec<RangeSummary>,
    pub extra_memory_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeSummary {
    pub address: String,
    pub size: u64,
    pub readable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionSummary {
    pub thread_id: u32,
    pub code: String,
    pub flags: u32,
    pub address: String,
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: u32,
    pub suspend_count: u32,
    pub priority: i32,
    pub teb: Option<String>,
    pub stack: Option<RangeSummary>,
    pub indirect_ranges: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub name: String,
    pub base: String,
    pub size: u64,
    pub timestamp: u32,
    pub checksum: u32,
    pub extra_memory_ranges: usize,
    pub annotations: BTreeMap<String, String>,
}

fn epoch_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn range_summary(snapshot: &crate::snapshot::MemorySnapshot) -> RangeSummary {
    RangeSummary {
        address: snapshot.address().to_string(),
        size: snapshot.size(),
        readable: snapshot.is_readable(),
    }
}

impl SnapshotSummary {
    /// Panics unless `snapshot` initialized successfully.
    pub fn from_snapshot(snapshot: &ProcessSnapshot) -> Self {
        let cpu = snapshot.process_cpu_times();
        let exception = snapshot.exception().map(|e| ExceptionSummary {
            thread_id: e.thread_id(),
            code: format!("0x{:08x}", e.exception_code()),
            flags: e.exception_flags(),
            address: e.exception_address().to_string(),
            codes: e.codes().iter().map(|c| format!("0x{:x}", c)).collect(),
        });
        let threads = snapshot
            .threads()
            .iter()
            .map(|t| ThreadSummary {
                id: t.thread_id(),
                suspend_count: t.suspend_count(),
                priority: t.priority(),
                teb: t.teb_address().map(|a| a.to_string()),
                stack: t.stack().map(range_summary),
                indirect_ranges: t.indirect_memory().len(),
            })
            .collect();
        let modules = snapshot
            .modules()
            .iter()
            .map(|m| ModuleSummary {
                name: m.name().to_string(),
                base: m.base().to_string(),
                size: m.size(),
                timestamp: m.timestamp(),
                checksum: m.checksum(),
                extra_memory_ranges: m.extra_memory_ranges().len(),
                annotations: m.annotations_simple_map().clone(),
            })
            .collect();

        Self {
            process_id: snapshot.process_id(),
            parent_process_id: snapshot.parent_process_id(),
            snapshot_time: epoch_seconds(snapshot.snapshot_time()),
            process_start_time: epoch_seconds(snapshot.process_start_time()),
            user_cpu_ms: cpu.user.as_millis(),
            system_cpu_ms: cpu.system.as_millis(),
            report_id: snapshot.report_id(),
            client_id: snapshot.client_id(),
            annotations: snapshot.annotations_simple_map().clone(),
            system: snapshot.system().clone(),
            crashpad_options: *snapshot.crashpad_options(),
            exception,
            threads,
            modules,
            unloaded_modules: snapshot.unloaded_modules().to_vec(),
            handles: snapshot.handles().to_vec(),
            memory_regions: snapshot.memory_map().len(),
            extra_memory: snapshot.extra_memory().snapshots().iter().map(range_summary).collect(),
            extra_memory_bytes: snapshot.extra_memory().total_bytes(),
        }
    }
}
