use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub project: ProjectDefaults,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections and fields keep
    /// their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Values a new project starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDefaults {
    pub map_name: String,
    pub bpm: u32,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            map_name: "mapNameMU".to_string(),
            bpm: 125,
        }
    }
}

/// Settings applied to generated files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub preview_loop_start: f64,
    pub preview_loop_end: f64,
    pub volume: f64,
    pub write_block_flow: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            preview_loop_start: 30.0,
            preview_loop_end: 60.0,
            volume: 1.0,
            write_block_flow: false,
        }
    }
}

/// Timeline description consumed by the `export` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub map_name: Option<String>,
    #[serde(default)]
    pub bpm: Option<u32>,
    pub audio_length_ms: f64,
    #[serde(default)]
    pub placements: Vec<PlacementEntry>,
}

impl ProjectFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Map name from the file, falling back to the configured default.
    pub fn map_name<'a>(&'a self, defaults: &'a ProjectDefaults) -> &'a str {
        self.map_name.as_deref().unwrap_or(&defaults.map_name)
    }

    pub fn bpm(&self, defaults: &ProjectDefaults) -> u32 {
        self.bpm.unwrap_or(defaults.bpm)
    }
}

/// One block on the timeline, referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementEntry {
    pub block: String,
    pub start_ms: f64,
    pub end_ms: f64,
}
