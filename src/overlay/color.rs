use std::fmt;

use serde::{Deserialize, Serialize};

/// Alpha every ring color is rendered with.
pub const RING_ALPHA: f32 = 0.9;

/// RGBA color of the ring, derived from the warmth slider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl RingColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: RING_ALPHA,
        }
    }

    /// Map a warmth percentage to a color.
    ///
    /// The scale is asymmetric: 0–50 blends cool blue into neutral white by
    /// raising red and green together, 50–100 blends white into warm orange by
    /// pulling green down by up to 60% and blue by up to 80%.
    pub fn from_warmth(warmth: f32) -> Self {
        let warmth = f64::from(super::config::clamp_percent(warmth));
        let channel = |v: f64| (255.0 * v).round() as u8;

        if warmth <= 50.0 {
            let factor = warmth / 50.0;
            Self::rgb(channel(factor), channel(factor), 255)
        } else {
            let factor = (warmth - 50.0) / 50.0;
            Self::rgb(
                255,
                channel(1.0 - factor * 0.6),
                channel(1.0 - factor * 0.8),
            )
        }
    }

    /// `0xRRGGBB`, for renderers that take packed colors.
    pub fn packed_rgb(&self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl Default for RingColor {
    fn default() -> Self {
        Self::rgb(255, 255, 255)
    }
}

impl fmt::Display for RingColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Label shown next to the warmth slider.
///
/// Neutral is a band around 50 rather than the exact value, since dragged
/// slider values are rarely whole numbers.
pub fn temperature_label(warmth: f32) -> &'static str {
    let warmth = super::config::clamp_percent(warmth);
    if warmth <= 0.0 {
        "Coolest"
    } else if warmth <= 45.0 {
        "Cool"
    } else if warmth < 55.0 {
        "Neutral"
    } else if warmth <= 75.0 {
        "Warm"
    } else if warmth < 100.0 {
        "Hot"
    } else {
        "Warmest"
    }
}
