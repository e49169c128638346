use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::OverlayError;

/// OS-level controls a settled slider value is forwarded to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlKind {
    Brightness,
    RingSize,
    ColorTemp,
}

impl ControlKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ControlKind::Brightness => "brightness",
            ControlKind::RingSize => "ringSize",
            ControlKind::ColorTemp => "colorTemp",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of debounced external-control values (0..=100).
pub trait ControlSink: Send + Sync + 'static {
    fn apply(&self, kind: ControlKind, value: u8) -> Result<(), OverlayError>;
}

/// Sink that only records the request in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingSink;

impl ControlSink for LoggingSink {
    fn apply(&self, kind: ControlKind, value: u8) -> Result<(), OverlayError> {
        info!("Setting system {} to {}%", kind, value);
        Ok(())
    }
}
