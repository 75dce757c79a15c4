// Tue Jan 15 2026 - Alex

pub mod bitness;
pub mod layout;
pub mod record;

pub use bitness::{Bitness, TargetTraits, Traits32, Traits64};
pub use record::{ListEntry, RemoteRecord, UnicodeString};
