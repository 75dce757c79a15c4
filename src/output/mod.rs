// Tue Jan 13 2026 - Alex

pub mod json;
pub mod summary;

pub use json::{JsonError, JsonSerializer};
pub use summary::SnapshotSummary;
