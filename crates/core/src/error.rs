//! Error types for the fallible subsystems.

use std::path::PathBuf;

use thiserror::Error;

/// Camera acquisition failures. Only raised at init; read errors during
/// capture are absorbed by the capture thread.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open camera {device_id}: {reason}")]
    DeviceOpenFailed { device_id: i32, reason: String },
    #[error("no camera backend compiled in (enable the `opencv-backend` feature)")]
    BackendUnavailable,
    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

/// Pose and gesture inference failures.
#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("failed to load model {path}: {reason}")]
    ModelLoadFailed { path: PathBuf, reason: String },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected output shape: expected {expected}, got {actual:?}")]
    BadOutputShape { expected: String, actual: Vec<usize> },
}

/// Configuration file failures. Callers usually log these and fall back to
/// defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
