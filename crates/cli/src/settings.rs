use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attendance_core::attendance::domain::attendance_ledger::DedupPolicy;
use attendance_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use attendance_core::shared::constants::{
    APP_DIR_NAME, DEFAULT_CAMERA_INDEX, DEFAULT_DOWNSCALE, DEFAULT_KNOWN_FACES_DIR,
    DEFAULT_LEDGER_FILE, DEFAULT_TOLERANCE,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupMode {
    /// One row per name per day.
    PerDay,
    /// A name anywhere in the file blocks it on every day.
    Substring,
}

impl From<DedupMode> for DedupPolicy {
    fn from(mode: DedupMode) -> Self {
        match mode {
            DedupMode::PerDay => DedupPolicy::PerDay,
            DedupMode::Substring => DedupPolicy::Substring,
        }
    }
}

/// Persistent defaults, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub known_faces: PathBuf,
    pub ledger: PathBuf,
    pub camera: String,
    /// Requested capture size, e.g. `1280x720`.
    pub camera_resolution: Option<String>,
    pub downscale: u32,
    pub tolerance: f64,
    pub confidence: f64,
    pub dedup: DedupMode,
    pub display: bool,
    pub models_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            known_faces: PathBuf::from(DEFAULT_KNOWN_FACES_DIR),
            ledger: PathBuf::from(DEFAULT_LEDGER_FILE),
            camera: DEFAULT_CAMERA_INDEX.to_string(),
            camera_resolution: None,
            downscale: DEFAULT_DOWNSCALE,
            tolerance: DEFAULT_TOLERANCE,
            confidence: DEFAULT_CONFIDENCE,
            dedup: DedupMode::PerDay,
            display: true,
            models_dir: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Load from `explicit`, or from the default location when `None`.
    ///
    /// A missing default file yields built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
