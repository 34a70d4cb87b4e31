//! Saved view preference: theme, layout mode and speed.
//!
//! Stored as a small JSON document. Loading never fails the caller: a missing, unreadable
//! or invalid file yields the defaults (with a warning for the latter two).

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    animation::config::{AnimationConfig, validate_speed},
    foundation::error::{JourneyError, JourneyResult},
    layout::stages::LayoutMode,
    render::theme::ThemeMode,
};

/// Environment variable overriding [`default_prefs_path`].
pub const PREFS_ENV: &str = "JOURNEYFLOW_PREFS";

const PREFS_FILE: &str = ".journeyflow.json";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewPrefs {
    pub theme: ThemeMode,
    pub mode: LayoutMode,
    pub speed: f64,
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            mode: LayoutMode::Sankey,
            speed: 1.0,
        }
    }
}

impl ViewPrefs {
    pub fn validate(&self) -> JourneyResult<()> {
        validate_speed(self.speed)
    }

    /// Strict load: `Ok(None)` when the file does not exist.
    pub fn try_load(path: &Path) -> JourneyResult<Option<Self>> {
        let s = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read prefs '{}'", path.display()))
                    .into());
            }
        };
        let prefs: Self = serde_json::from_str(&s)
            .map_err(|e| JourneyError::serde(format!("prefs '{}': {e}", path.display())))?;
        prefs.validate()?;
        Ok(Some(prefs))
    }

    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(prefs) => prefs.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring saved preferences");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> JourneyResult<()> {
        self.validate()?;
        let json =
            serde_json::to_string_pretty(self).map_err(|e| JourneyError::serde(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create prefs dir '{}'", parent.display()))?;
        }
        std::fs::write(path, json).with_context(|| format!("write prefs '{}'", path.display()))?;
        Ok(())
    }

    /// Animation defaults with the saved speed applied.
    pub fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            speed_multiplier: self.speed,
            ..AnimationConfig::default()
        }
    }
}

pub fn default_prefs_path() -> PathBuf {
    std::env::var_os(PREFS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(PREFS_FILE))
}

#[cfg(test)]
#[path = "../tests/unit/prefs.rs"]
mod tests;
