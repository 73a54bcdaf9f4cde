//! Engine settings read from `Data/engine.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::stream::{self, StreamError};

/// Default location of the engine settings, relative to the working
/// directory.
pub const CONFIG_PATH: &str = "Data/engine.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self { title: "quarry".into(), width: 1280, height: 720 }
    }
}

/// Every field has a default, so a partial or missing file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub updates_per_second: u32,
    pub asset_root: PathBuf,
    pub scene_root: PathBuf,
    pub initial_scene: String,
    pub actions_file: PathBuf,
    pub control_prompts_file: PathBuf,
    pub window: WindowSettings,
    /// Channel group name to volume.
    pub channels: HashMap<String, f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            updates_per_second: 60,
            asset_root: "Data".into(),
            scene_root: "Data/Scenes".into(),
            initial_scene: "Main".into(),
            actions_file: "Data/Input/Actions.json".into(),
            control_prompts_file: "Data/Input/ControlPrompts.json".into(),
            window: WindowSettings::default(),
            channels: ["master", "music", "sfx"].into_iter().map(|name| (name.to_string(), 1.0)).collect(),
        }
    }
}

impl EngineConfig {
    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        if !path.is_file() {
            log::info!("no engine config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = stream::parse_file(path)?;
        let mut config: Self = serde_json::from_value(json)
            .map_err(|source| StreamError::Parse { path: path.to_path_buf(), source })?;
        if config.updates_per_second == 0 {
            log::warn!("updates_per_second must be positive, using 60");
            config.updates_per_second = 60;
        }
        Ok(config)
    }

    /// Seconds per fixed tick. An `updates_per_second` of zero counts as one.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.updates_per_second.max(1) as f32
    }
}
