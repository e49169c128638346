use thiserror::Error;

use crate::control::ControlKind;
use crate::overlay::SurfaceHandle;

/// Everything that can go wrong between the control panel and the overlay
/// surfaces.
///
/// None of these are fatal to the panel: the command bridge turns them into
/// tagged failure responses and the control state machine degrades to
/// in-panel rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// The platform reported no usable displays.
    #[error("display enumeration failed: {0}")]
    Enumeration(String),

    /// Some or all surfaces of a `create_all` call could not be created.
    #[error("created {created} of {requested} overlay surface(s): {reason}")]
    SurfaceCreation {
        created: usize,
        requested: usize,
        reason: String,
    },

    /// A `destroy_all` arrived while this creation was still in flight.
    #[error("overlay creation superseded by a teardown request")]
    Superseded,

    /// The panel runs without an overlay backend.
    #[error("command bridge unavailable")]
    BridgeUnavailable,

    /// The surface is already gone (destroyed, or closed externally).
    #[error("overlay surface {0} is no longer alive")]
    StaleHandle(SurfaceHandle),

    #[error("external {kind} control failed: {reason}")]
    ExternalControl { kind: ControlKind, reason: String },

    #[error("platform error: {0}")]
    Platform(String),
}

impl OverlayError {
    /// Stale-handle errors are expected during teardown and are never surfaced
    /// to the user.
    pub fn is_stale(&self) -> bool {
        matches!(self, OverlayError::StaleHandle(_))
    }
}

/// A monitor selection token that is not `primary`, `all` or `display_<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown monitor selection `{0}`")]
pub struct SelectionParseError(pub String);
