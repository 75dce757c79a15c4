// Tue Jan 15 2026 - Alex

pub mod config;
pub mod memory;
pub mod output;
pub mod process;
pub mod snapshot;
pub mod structure;
pub mod ui;
pub mod utils;

pub use config::SnapshotConfig;
pub use memory::{Address, MemoryReader};
pub use process::{ProcessHandle, ProcessReader, SuspensionState};
pub use snapshot::{ProcessSnapshot, SnapshotError};
