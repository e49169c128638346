use serde::{Deserialize, Serialize};

use crate::monitor::DisplayBounds;

use super::color::RingColor;

/// Clamp a slider percentage into `0..=100`. NaN becomes 0.
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Visual parameters of the ring, all in percent.
///
/// The control state machine owns the one logical copy; everything else gets
/// clones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingParameters {
    pub thickness: f32,
    pub brightness: f32,
    pub size: f32,
    pub warmth: f32,
    /// Always derived from `warmth`.
    pub color: RingColor,
}

impl RingParameters {
    pub fn new(thickness: f32, brightness: f32, size: f32, warmth: f32) -> Self {
        let warmth = clamp_percent(warmth);
        Self {
            thickness: clamp_percent(thickness),
            brightness: clamp_percent(brightness),
            size: clamp_percent(size),
            warmth,
            color: RingColor::from_warmth(warmth),
        }
    }

    /// Merge a partial update. Fields the patch leaves out keep their value.
    pub fn apply(&mut self, patch: &RingPatch) {
        if let Some(thickness) = patch.thickness {
            self.thickness = clamp_percent(thickness);
        }
        if let Some(brightness) = patch.brightness {
            self.brightness = clamp_percent(brightness);
        }
        if let Some(size) = patch.size {
            self.size = clamp_percent(size);
        }
        if let Some(warmth) = patch.warmth {
            self.warmth = clamp_percent(warmth);
            self.color = RingColor::from_warmth(self.warmth);
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }

    pub fn merged(mut self, patch: &RingPatch) -> Self {
        self.apply(patch);
        self
    }

    pub fn geometry(&self) -> RingGeometry {
        RingGeometry::from_parameters(self)
    }
}

impl Default for RingParameters {
    fn default() -> Self {
        Self::new(50.0, 100.0, 25.0, 50.0)
    }
}

/// A partial parameter update, as sent over the broadcast channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmth: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RingColor>,
}

impl RingPatch {
    pub fn thickness(value: f32) -> Self {
        Self {
            thickness: Some(value),
            ..Self::default()
        }
    }

    pub fn brightness(value: f32) -> Self {
        Self {
            brightness: Some(value),
            ..Self::default()
        }
    }

    pub fn size(value: f32) -> Self {
        Self {
            size: Some(value),
            ..Self::default()
        }
    }

    /// Warmth updates always carry the derived color along.
    pub fn warmth(value: f32) -> Self {
        Self {
            warmth: Some(value),
            color: Some(RingColor::from_warmth(value)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<RingParameters> for RingPatch {
    fn from(params: RingParameters) -> Self {
        Self {
            thickness: Some(params.thickness),
            brightness: Some(params.brightness),
            size: Some(params.size),
            warmth: Some(params.warmth),
            color: Some(params.color),
        }
    }
}

/// Pixel-space ring geometry a renderer draws from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingGeometry {
    /// Outer diameter in pixels (100–1200).
    pub diameter: f32,
    /// Stroke width in pixels (2–300).
    pub border_width: f32,
    /// Ring opacity (0.1–1.0).
    pub opacity: f32,
}

impl RingGeometry {
    pub const MAX_DIAMETER: f32 = 1200.0;
    pub const MAX_BORDER: f32 = 300.0;

    pub fn from_parameters(params: &RingParameters) -> Self {
        Self {
            diameter: (params.size / 100.0 * Self::MAX_DIAMETER).clamp(100.0, Self::MAX_DIAMETER),
            border_width: (params.thickness / 100.0 * Self::MAX_BORDER)
                .clamp(2.0, Self::MAX_BORDER),
            opacity: (params.brightness / 100.0).clamp(0.1, 1.0),
        }
    }

    /// Opacity as a layered-window alpha byte.
    pub fn alpha(&self) -> u8 {
        (self.opacity * 255.0).round() as u8
    }
}

/// Parameters needed to spawn a single overlay surface on a specific display.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayConfig {
    /// Creation-order index of the surface within its `create_all` call.
    pub index: usize,
    /// Exact bounds of the target display.
    pub bounds: DisplayBounds,
    /// Parameters to render before the first broadcast arrives.
    pub params: RingParameters,
    /// Whether pointer input passes through to windows underneath.
    pub mouse_transparent: bool,
}
