use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectionParseError;

/// Geometry of a display in virtual-screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBounds {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

/// Snapshot of a connected display, taken when targets are resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    /// Ordinal in enumeration order.
    pub id: usize,
    /// Device name reported by the platform (e.g. `\\.\DISPLAY1`), may be empty.
    #[serde(default)]
    pub name: String,
    pub bounds: DisplayBounds,
    pub is_primary: bool,
}

impl Display {
    /// The stand-in target used when the platform reports no displays at all.
    pub fn synthetic() -> Self {
        Self {
            id: 0,
            name: String::new(),
            bounds: DisplayBounds {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            },
            is_primary: true,
        }
    }

    /// Human-readable label used by the monitor picker.
    pub fn label(&self) -> String {
        format!(
            "Display {} ({}x{})",
            self.id + 1,
            self.bounds.width,
            self.bounds.height
        )
    }
}

/// Which display(s) should receive an overlay.
///
/// Persisted as a short token: `primary`, `all` or `display_<index>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MonitorSelection {
    #[default]
    Primary,
    All,
    Specific(usize),
}

impl MonitorSelection {
    /// Parse a token, falling back to [`MonitorSelection::Primary`] for
    /// anything unrecognised.
    pub fn from_token_lossy(token: &str) -> Self {
        token.parse().unwrap_or_else(|e: SelectionParseError| {
            tracing::warn!("{e}, falling back to primary display");
            MonitorSelection::Primary
        })
    }
}

impl fmt::Display for MonitorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorSelection::Primary => f.write_str("primary"),
            MonitorSelection::All => f.write_str("all"),
            MonitorSelection::Specific(index) => write!(f, "display_{index}"),
        }
    }
}

impl FromStr for MonitorSelection {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "primary" => Ok(MonitorSelection::Primary),
            "all" => Ok(MonitorSelection::All),
            other => other
                .strip_prefix("display_")
                .and_then(|index| index.parse().ok())
                .map(MonitorSelection::Specific)
                .ok_or_else(|| SelectionParseError(s.to_string())),
        }
    }
}

impl From<MonitorSelection> for String {
    fn from(selection: MonitorSelection) -> Self {
        selection.to_string()
    }
}

impl TryFrom<String> for MonitorSelection {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
