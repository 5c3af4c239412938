use std::{
    fs::File,
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::sim::SimStart;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraConfig {
    /// Plays back the images in `path`.
    Directory { path: PathBuf },
    /// Renders the bench simulation's view of the peg.
    Synthetic {
        #[serde(default)]
        noise: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub dst_address: String,
    #[serde(default)]
    pub src_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub dir: PathBuf,
    #[serde(default = "DisplayConfig::default_every")]
    pub every: u64,
    #[serde(default = "DisplayConfig::default_keep")]
    pub keep: u64,
}

impl DisplayConfig {
    fn default_every() -> u64 {
        10
    }

    fn default_keep() -> u64 {
        4
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub primary_camera: CameraConfig,
    pub secondary_camera: CameraConfig,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_period_ms: u64,
    pub control_period_ms: u64,
    /// Chooser entry, e.g. "Center". Unknown names hold for the whole period.
    pub auto_selection: String,
    pub auto_duration_s: f64,
    pub telemetry: Option<TelemetryConfig>,
    pub display: Option<DisplayConfig>,
    pub sim: SimStart,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            primary_camera: CameraConfig::Synthetic { noise: 0. },
            secondary_camera: CameraConfig::Synthetic { noise: 0. },
            frame_width: 320,
            frame_height: 240,
            frame_period_ms: 33,
            control_period_ms: 20,
            auto_selection: "Center".to_string(),
            auto_duration_s: 15.,
            telemetry: None,
            display: None,
            sim: SimStart::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Like `load`, but a missing file gives the defaults.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        match File::open(path) {
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("{} not found, using defaults", path.display());
                Ok(Config::default())
            }
            _ => Self::load(path),
        }
    }
}
