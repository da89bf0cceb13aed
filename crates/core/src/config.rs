//! Runtime configuration loaded from `popcorn.toml`.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::person::DEFAULT_CONF_THRESHOLD;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "popcorn.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: crate::SCREEN_WIDTH,
            height: crate::SCREEN_HEIGHT,
            title: "Popcorn Battle".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device_id: i32,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 1280,
            height: 720,
            fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub pose_model: PathBuf,
    pub gesture_model: PathBuf,
    pub confidence_threshold: f32,
    pub num_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pose_model: PathBuf::from("assets/models/movenet_lightning.onnx"),
            gesture_model: PathBuf::from("assets/models/hand_landmarker.task"),
            confidence_threshold: DEFAULT_CONF_THRESHOLD,
            num_threads: 4,
        }
    }
}

/// How a capture is credited to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAssignment {
    /// By the display zone of the colliding hand.
    #[default]
    Zone,
    /// Every capture goes to player 1.
    Single,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub duration_s: f32,
    pub hand_radius: f32,
    pub perfect_radius: f32,
    pub combo_timeout_s: f32,
    pub countdown_s: f32,
    pub player_assignment: PlayerAssignment,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            duration_s: 45.0,
            hand_radius: 50.0,
            perfect_radius: 30.0,
            combo_timeout_s: 2.0,
            countdown_s: 0.0,
            player_assignment: PlayerAssignment::Zone,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub particle_capacity: usize,
    pub popup_capacity: usize,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            particle_capacity: 500,
            popup_capacity: 32,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub models: ModelConfig,
    pub rules: RulesConfig,
    pub effects: EffectsConfig,
}

impl GameConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load config, falling back to defaults when the file is missing or bad.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {:?}", path);
                cfg
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.window.width, 1920);
        assert_eq!(cfg.window.height, 1080);
        assert_eq!(cfg.camera.width, 1280);
        assert_eq!(cfg.rules.duration_s, 45.0);
        assert_eq!(cfg.rules.hand_radius, 50.0);
        assert_eq!(cfg.effects.particle_capacity, 500);
        assert_eq!(cfg.rules.player_assignment, PlayerAssignment::Zone);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"
            [camera]
            device_id = 2

            [rules]
            player_assignment = "single"
            seed = 7
        "#;
        let cfg = GameConfig::from_toml_str(text, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.camera.device_id, 2);
        assert_eq!(cfg.camera.width, 1280);
        assert_eq!(cfg.rules.player_assignment, PlayerAssignment::Single);
        assert_eq!(cfg.rules.seed, Some(7));
        assert_eq!(cfg.rules.combo_timeout_s, 2.0);
    }

    #[test]
    fn test_malformed_file_errors() {
        let err = GameConfig::from_toml_str("[camera\nwidth = ", Path::new("bad.toml"));
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg = GameConfig::load(Path::new("/definitely/not/here/popcorn.toml"));
        assert_eq!(cfg, GameConfig::default());
    }
}
