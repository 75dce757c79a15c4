// Wed Oct 14 2026 - Alex

use crate::memory::{
    Address, MemoryError, MemoryRange, MemoryRegion, PageProtection, ProcessMemory, RegionKind,
};
use crate::process::{
    CpuTimes, HandleInfo, ModuleInfo, ProcessHandle, ProcessInfo, ProcessReader, SuspensionState,
    ThreadInfo,
};
use goblin::elf::header::{header64::SIZEOF_EHDR, EI_CLASS, ELFCLASS64};
use goblin::elf::Elf;
use libc::pid_t;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A live Linux process described through `/proc`.
///
/// Linux has no PEB, loader lists or unload ring, so those sections of a
/// snapshot come back empty; the rest is filled from procfs.
#[derive(Debug, Clone)]
pub struct LinuxProcess {
    pid: pid_t,
    root: PathBuf,
}

/// The fields of `/proc/<pid>/stat` a snapshot needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFields {
    pub ppid: u32,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub priority: i64,
    pub start_ticks: u64,
}

impl LinuxProcess {
    pub fn new(pid: pid_t) -> Self {
        Self {
            pid,
            root: PathBuf::from(format!("/proc/{}", pid)),
        }
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    fn read_proc(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.root.join(name)).ok()
    }

    fn stat(&self) -> Option<StatFields> {
        parse_stat(&self.read_proc("stat")?)
    }

    fn clock_ticks() -> u64 {
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if ticks <= 0 {
            100
        } else {
            ticks as u64
        }
    }

    fn boot_time() -> Option<u64> {
        let stat = fs::read_to_string("/proc/stat").ok()?;
        stat.lines()
            .find_map(|line| line.strip_prefix("btime "))
            .and_then(|v| v.trim().parse().ok())
    }

    fn stack_region(&self) -> Option<MemoryRange> {
        self.memory_info()
            .into_iter()
            .find(|r| r.name() == Some("[stack]"))
            .map(|r| *r.range())
    }
}

impl ProcessInfo for LinuxProcess {
    fn process_id(&self) -> u32 {
        self.pid as u32
    }

    fn parent_process_id(&self) -> u32 {
        self.stat().map(|s| s.ppid).unwrap_or(0)
    }

    fn is_64bit(&self) -> bool {
        let mut header = [0u8; SIZEOF_EHDR];
        let class = fs::File::open(self.root.join("exe"))
            .and_then(|mut exe| exe.read_exact(&mut header))
            .ok()
            .and_then(|_| Elf::parse_header(&header).ok())
            .map(|h| h.e_ident[EI_CLASS] == ELFCLASS64);
        class.unwrap_or(cfg!(target_pointer_width = "64"))
    }

    fn peb(&self) -> Option<(Address, u64)> {
        None
    }

    fn start_time(&self) -> SystemTime {
        let (Some(stat), Some(boot)) = (self.stat(), Self::boot_time()) else {
            return UNIX_EPOCH;
        };
        let ticks = Self::clock_ticks();
        let since_boot = Duration::from_secs(stat.start_ticks / ticks)
            + Duration::from_nanos((stat.start_ticks % ticks) * 1_000_000_000 / ticks);
        UNIX_EPOCH + Duration::from_secs(boot) + since_boot
    }

    fn cpu_times(&self) -> CpuTimes {
        let Some(stat) = self.stat() else {
            return CpuTimes::default();
        };
        let ticks = Self::clock_ticks();
        CpuTimes {
            user: Duration::from_millis(stat.utime_ticks * 1000 / ticks),
            system: Duration::from_millis(stat.stime_ticks * 1000 / ticks),
        }
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        modules_from_regions(&self.memory_info())
    }

    fn threads(&self) -> Vec<ThreadInfo> {
        let Ok(entries) = fs::read_dir(self.root.join("task")) else {
            return Vec::new();
        };
        let main_stack = self.stack_region();
        let mut threads: Vec<ThreadInfo> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse::<u32>().ok()))
            .map(|tid| {
                let mut thread = ThreadInfo::new(tid);
                if let Some(stat) = fs::read_to_string(self.root.join(format!("task/{}/stat", tid)))
                    .ok()
                    .and_then(|s| parse_stat(&s))
                {
                    thread.priority = stat.priority as i32;
                }
                if tid == self.pid as u32 {
                    thread.stack_region = main_stack;
                }
                thread
            })
            .collect();
        threads.sort_by_key(|t| t.id);
        threads
    }

    fn handles(&self) -> Vec<HandleInfo> {
        let Ok(entries) = fs::read_dir(self.root.join("fd")) else {
            return Vec::new();
        };
        let mut handles: Vec<HandleInfo> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let fd = e.file_name().to_str()?.parse::<u32>().ok()?;
                let target = fs::read_link(e.path()).ok()?.to_string_lossy().into_owned();
                Some(HandleInfo {
                    handle: fd,
                    type_name: fd_type_name(&target).to_string(),
                    object_name: target,
                    handle_count: 1,
                    ..HandleInfo::default()
                })
            })
            .collect();
        handles.sort_by_key(|h| h.handle);
        handles
    }

    fn memory_info(&self) -> Vec<MemoryRegion> {
        self.read_proc("maps")
            .map(|maps| maps.lines().filter_map(parse_maps_line).collect())
            .unwrap_or_default()
    }

    fn os_version(&self) -> Option<String> {
        fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
    }
}

impl ProcessHandle for LinuxProcess {
    fn open(&self, suspension_state: SuspensionState) -> Result<ProcessReader, MemoryError> {
        let memory = ProcessMemory::attach(self.pid)?;
        if !self.root.exists() {
            return Err(MemoryError::ProcessNotFound(format!("{} is gone", self.root.display())));
        }
        Ok(ProcessReader::new(
            Arc::new(memory),
            Arc::new(self.clone()),
            suspension_state,
        ))
    }
}

/// Parses `/proc/<pid>/stat`. The command name may itself contain spaces and
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(stat: &str) -> Option<StatFields> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // `fields[0]` is the state, i.e. field 3 of the full line.
    let field = |n: usize| fields.get(n - 3).copied();
    Some(StatFields {
        ppid: field(4)?.parse().ok()?,
        utime_ticks: field(14)?.parse().ok()?,
        stime_ticks: field(15)?.parse().ok()?,
        priority: field(18)?.parse().ok()?,
        start_ticks: field(22)?.parse().ok()?,
    })
}

pub fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let mut parts = line.split_whitespace();
    let (start, end) = parts.next()?.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    if end < start {
        return None;
    }
    let perms = parts.next()?.as_bytes();
    let _offset = parts.next()?;
    let _dev = parts.next()?;
    let _inode = parts.next()?;
    let path = parts.collect::<Vec<_>>().join(" ");

    let (r, w, x) = (
        perms.first() == Some(&b'r'),
        perms.get(1) == Some(&b'w'),
        perms.get(2) == Some(&b'x'),
    );
    let protect = match (r, w, x) {
        (true, true, true) => PageProtection::EXECUTE_READWRITE,
        (true, false, true) => PageProtection::EXECUTE_READ,
        (false, _, true) => PageProtection::EXECUTE,
        (true, true, false) => PageProtection::READWRITE,
        (true, false, false) => PageProtection::READONLY,
        _ => PageProtection::NOACCESS,
    };
    let kind = match (path.starts_with('/'), x) {
        (true, true) => RegionKind::Image,
        (true, false) => RegionKind::Mapped,
        _ => RegionKind::Private,
    };

    let range = MemoryRange::new(Address::new(start), Address::new(end));
    let mut region = MemoryRegion::committed(range, protect).with_kind(kind);
    if !path.is_empty() {
        region = region.with_name(path);
    }
    Some(region)
}

/// Groups file-backed mappings into modules. A file counts as a module once
/// any of its mappings is executable.
pub fn modules_from_regions(regions: &[MemoryRegion]) -> Vec<ModuleInfo> {
    let mut spans: BTreeMap<&str, (u64, u64, bool)> = BTreeMap::new();
    for region in regions {
        let Some(name) = region.name().filter(|n| n.starts_with('/')) else {
            continue;
        };
        let span = spans
            .entry(name)
            .or_insert((region.start().as_u64(), region.end().as_u64(), false));
        span.0 = span.0.min(region.start().as_u64());
        span.1 = span.1.max(region.end().as_u64());
        span.2 |= region.kind() == RegionKind::Image;
    }
    let mut modules: Vec<ModuleInfo> = spans
        .into_iter()
        .filter(|(_, (_, _, executable))| *executable)
        .map(|(name, (start, end, _))| ModuleInfo::new(name, Address::new(start), end - start))
        .collect();
    modules.sort_by_key(|m| m.base);
    modules
}

fn fd_type_name(target: &str) -> &'static str {
    if target.starts_with("socket:") {
        "Socket"
    } else if target.starts_with("pipe:") {
        "Pipe"
    } else if target.starts_with("anon_inode:") {
        "AnonInode"
    } else {
        "File"
    }
}
