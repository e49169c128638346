use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::monitor::MonitorSelection;

pub const SETTINGS_DIR_NAME: &str = "ring-light";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// The only state that outlives a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelSettings {
    pub preferred_monitor: MonitorSelection,
    pub debug_logging: bool,
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let config_dir = dirs_next::config_dir().ok_or_else(|| anyhow!("no user config directory"))?;
    Ok(config_dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

impl PanelSettings {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from_path(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Using default panel settings: {e:#}");
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // An unknown monitor token is not worth discarding the whole file.
        let mut value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))?;
        if let Some(token) = value.get("preferredMonitor").and_then(|v| v.as_str()) {
            let selection = MonitorSelection::from_token_lossy(token);
            value["preferredMonitor"] = serde_json::Value::String(selection.to_string());
        }
        serde_json::from_value(value)
            .with_context(|| format!("deserialize settings file {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("serialize panel settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("write settings file {}", path.display()))
    }

    /// Read-modify-write of the preferred monitor, leaving other keys alone.
    pub fn store_preferred_monitor(path: &Path, selection: MonitorSelection) -> Result<()> {
        let mut settings = Self::load_or_default(path);
        settings.preferred_monitor = selection;
        settings.save_to_path(path)
    }
}
