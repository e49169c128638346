pub mod backend;
pub mod color;
pub mod config;
pub mod headless;
pub mod manager;
#[cfg(windows)]
pub mod window;

pub use backend::{SurfaceBackend, SurfaceEvent, SurfaceEvents, SurfaceHandle};
pub use color::{RING_ALPHA, RingColor, temperature_label};
pub use config::{OverlayConfig, RingGeometry, RingParameters, RingPatch, clamp_percent};
pub use headless::HeadlessBackend;
pub use manager::{CreateOutcome, ManagerOptions, OverlayManager, SurfaceStatus};
#[cfg(windows)]
pub use window::Win32Backend;
