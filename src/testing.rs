//! Fixtures shared by the in-crate test modules.

use std::sync::Mutex;

use crate::control::{ControlKind, ControlSink};
use crate::error::OverlayError;
use crate::monitor::{Display, DisplayBounds};

/// Sink that remembers every call, optionally failing them all.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<(ControlKind, u8)>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(ControlKind, u8)> {
        self.calls.lock().expect("sink lock").clone()
    }
}

impl ControlSink for RecordingSink {
    fn apply(&self, kind: ControlKind, value: u8) -> Result<(), OverlayError> {
        if self.fail {
            return Err(OverlayError::Platform("no backlight control".into()));
        }
        self.calls.lock().expect("sink lock").push((kind, value));
        Ok(())
    }
}

/// `count` side-by-side 1920x1080 displays, the first one primary.
pub fn side_by_side(count: usize) -> Vec<Display> {
    (0..count)
        .map(|id| Display {
            id,
            name: format!("DISPLAY{}", id + 1),
            bounds: DisplayBounds {
                x: id as i32 * 1920,
                y: 0,
                width: 1920,
                height: 1080,
            },
            is_primary: id == 0,
        })
        .collect()
}
