// Tue Oct 13 2026 - Alex

pub mod info;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod reader;

pub use info::{
    CpuTimes, HandleInfo, ModuleInfo, ProcessInfo, SuspensionState, ThreadContext, ThreadInfo,
    UnloadTraceLocation,
};
#[cfg(target_os = "linux")]
pub use linux::LinuxProcess;
pub use reader::{ProcessHandle, ProcessReader};
