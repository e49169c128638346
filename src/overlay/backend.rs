use std::fmt;
use std::future::Future;

use tokio::sync::mpsc;

use crate::error::OverlayError;
use crate::monitor::Display;

use super::config::{OverlayConfig, RingParameters};

/// Opaque token a backend hands out for each surface it creates.
///
/// Only the [`OverlayManager`](super::OverlayManager) holds these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Asynchronous notifications from a surface back to its manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The surface finished its first render and can take parameter pushes.
    Ready(SurfaceHandle),
    /// The readiness window elapsed without a `Ready`.
    ReadyTimeout(SurfaceHandle),
    /// The surface went away on its own (window closed, display unplugged).
    Closed(SurfaceHandle),
}

pub type SurfaceEvents = mpsc::UnboundedSender<SurfaceEvent>;

/// Platform layer that actually puts pixels on a display.
///
/// Implementations must make every call other than `create_surface` cheap and
/// non-blocking: pushes are delivered under the manager's lock, in order.
pub trait SurfaceBackend: Send + Sync + 'static {
    /// Snapshot the connected displays.
    fn displays(&self) -> Result<Vec<Display>, OverlayError>;

    /// Create a borderless, always-on-top surface covering `config.bounds`.
    ///
    /// Readiness is reported later through `events`.
    fn create_surface(
        &self,
        config: OverlayConfig,
        events: SurfaceEvents,
    ) -> impl Future<Output = Result<SurfaceHandle, OverlayError>> + Send;

    /// Queue a full parameter set for the surface. Returns
    /// [`OverlayError::StaleHandle`] if the surface no longer exists.
    fn push_params(
        &self,
        handle: SurfaceHandle,
        params: &RingParameters,
    ) -> Result<(), OverlayError>;

    fn set_mouse_transparent(
        &self,
        handle: SurfaceHandle,
        transparent: bool,
    ) -> Result<(), OverlayError>;

    /// Tear the surface down. Destroying an already-destroyed surface is not
    /// an error worth more than [`OverlayError::StaleHandle`].
    fn destroy_surface(&self, handle: SurfaceHandle) -> Result<(), OverlayError>;
}
