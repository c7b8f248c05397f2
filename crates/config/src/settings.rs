// Application settings
// Loaded from ~/.config/pipegrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use pipegrid_core::PipelineType;

pub const DEFAULT_MARQUEE_THRESHOLD: f32 = 6.0;
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Timeline interaction
    #[serde(rename = "timeline.marqueeThreshold")]
    pub marquee_threshold: f32,

    // Pipeline
    #[serde(rename = "pipeline.type")]
    pub pipeline_type: PipelineType,

    // Catalog
    #[serde(rename = "catalog.dir")]
    pub catalog_dir: Option<String>,  // None = platform data dir

    #[serde(rename = "catalog.remoteUrl")]
    pub remote_url: Option<String>,  // None = local only

    #[serde(rename = "catalog.remoteTimeoutSecs")]
    pub remote_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marquee_threshold: DEFAULT_MARQUEE_THRESHOLD,
            pipeline_type: PipelineType::default(),
            catalog_dir: None,
            remote_url: None,
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Pixels the pointer must travel before a press becomes a marquee drag
    "timeline.marqueeThreshold": 6,

    // Pipeline type: "culture", "curing", "separation", "extraction"
    "pipeline.type": "culture",

    // Preset/defaults catalog. null dir = platform data directory.
    // Set remoteUrl to sync with a server; local copies are always kept.
    "catalog.dir": null,
    "catalog.remoteUrl": null,
    "catalog.remoteTimeoutSecs": 10
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pipegrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default path, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with the commented defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines starting with `//`.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to the default path
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Marquee threshold, never negative.
    pub fn effective_threshold(&self) -> f32 {
        if self.marquee_threshold.is_finite() && self.marquee_threshold >= 0.0 {
            self.marquee_threshold
        } else {
            DEFAULT_MARQUEE_THRESHOLD
        }
    }

    /// Root of the local catalog.
    pub fn effective_catalog_dir(&self) -> PathBuf {
        match self.catalog_dir.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pipegrid")
                .join("catalog"),
        }
    }

    /// Remote URL, if one is set and non-blank.
    pub fn effective_remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

/// Create default settings file with comments
fn create_default_file(path: &Path) {
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_FILE) {
        log::warn!("error writing default settings.json: {}", e);
    }
}
