pub mod enumerate;
pub mod resolve;
pub mod types;

pub use enumerate::{enumerate_displays, snapshot_or_synthetic};
pub use resolve::resolve;
pub use types::{Display, DisplayBounds, MonitorSelection};
