// Wed Jan 15 2026 - Alex

pub mod banner;
pub mod spinner;

pub use banner::{Banner, BannerStyle};
pub use spinner::ProgressSpinner;
