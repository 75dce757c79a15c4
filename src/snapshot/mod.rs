// Wed Oct 14 2026 - Alex

pub mod critical_section;
pub mod error;
pub mod exception;
pub mod handle;
pub mod loader;
pub mod memory;
pub mod module;
pub mod options;
pub mod process;
pub mod state;
pub mod system;
#[cfg(test)]
pub mod testing;
pub mod thread;
pub mod unloaded;

pub use error::{Result, SnapshotError};
pub use exception::ExceptionSnapshot;
pub use handle::HandleSnapshot;
pub use loader::LoaderDataWalker;
pub use memory::{ExtraMemory, MemoryContents, MemorySnapshot};
pub use module::ModuleSnapshot;
pub use options::{CrashpadOptions, TriState};
pub use process::ProcessSnapshot;
pub use system::{CpuArchitecture, SystemSnapshot};
pub use thread::ThreadSnapshot;
pub use unloaded::UnloadedModuleSnapshot;
