//! App settings loaded from `opswatch.toml`.
//!
//! Every section deserializes with defaults so a partial file works, and
//! a missing file falls back to `AppSettings::default()` at the caller.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub sla: SectionToggle,
    #[serde(default)]
    pub feeds: SectionToggle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub log_level: String,
    pub customers_file: String,
    pub state_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            customers_file: "customers.json".into(),
            state_dir: "state".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionToggle {
    pub enabled: bool,
}

impl Default for SectionToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| format!("Failed to write {}: {}", path.as_ref().display(), e))
    }
}
