// Tue Jan 13 2026 - Alex

pub mod address;
pub mod error;
pub mod map;
#[cfg(target_os = "linux")]
pub mod process;
pub mod protection;
pub mod range;
pub mod region;
pub mod sparse;
pub mod traits;

pub use address::Address;
pub use error::MemoryError;
pub use map::MemoryMap;
#[cfg(target_os = "linux")]
pub use process::ProcessMemory;
pub use protection::{PageProtection, Protection};
pub use range::MemoryRange;
pub use region::{MemoryRegion, RegionKind, RegionState};
pub use sparse::SparseMemory;
pub use traits::MemoryReader;
