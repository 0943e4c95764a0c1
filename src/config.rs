// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::types::FacingMode;
use crate::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, EncodingQuality, wire};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the user's config dir
const CONFIG_DIR_NAME: &str = "snapsight";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis endpoint receiving the multipart upload
    pub endpoint: String,
    /// Preferred camera facing when no device is pinned
    pub facing: FacingMode,
    /// JPEG quality for camera captures
    pub jpeg_quality: EncodingQuality,
    /// Whole-request timeout for the analysis call
    pub request_timeout_secs: u64,
    /// Pin a specific device path (e.g. /dev/video2), overrides `facing`
    pub camera_device: Option<String>,
    /// Physical location per device path ("front" / "back"), used to honour `facing`
    pub camera_locations: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: wire::DEFAULT_ENDPOINT.to_string(),
            facing: FacingMode::default(), // rear camera
            jpeg_quality: EncodingQuality::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            camera_device: None,
            camera_locations: HashMap::new(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/snapsight/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one the default path is tried and
    /// a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        let config = Self::from_json(&text)
            .map_err(|e| format!("Invalid config '{}': {}", path.display(), e))?;
        info!(path = %path.display(), endpoint = %config.endpoint, "Loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
