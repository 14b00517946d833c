//! Application configuration.
//!
//! A single JSON document; every field is optional and falls back to its
//! default, so `{}` is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::boot::BootTiming;
use crate::error::{Error, Result};
use crate::intensity::IntensityProfile;
use crate::launch::ServerTarget;
use crate::script::{ScriptLine, default_script, load_script, validate_script};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerTarget,
    pub intensity: IntensityProfile,
    pub muted: bool,
    pub boot: BootTiming,
    /// Boot script file; the built-in script when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::from_json(&raw)?;
        // Script paths are relative to the config file.
        if let (Some(script), Some(dir)) = (config.script.as_mut(), path.parent()) {
            if script.is_relative() {
                *script = dir.join(&*script);
            }
        }
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// The configured boot script, validated against the boot timing.
    pub fn script_lines(&self) -> Result<Vec<ScriptLine>> {
        let lines = match &self.script {
            Some(path) => load_script(path)?,
            None => default_script(),
        };
        validate_script(&lines, self.boot.total_ms)?;
        Ok(lines)
    }
}
