//! Hand-gesture estimator: landmark model when available, skin heuristic
//! otherwise.

use std::path::Path;
use std::time::Instant;

use popcorn_core::{Frame, GestureResult, PerceptionError};

use crate::ErrorThrottle;

#[cfg(feature = "onnx")]
use crate::landmarks::{is_ok_gesture, parse_landmarks};
#[cfg(feature = "onnx")]
use ort::session::{builder::GraphOptimizationLevel, Session};
#[cfg(feature = "onnx")]
use popcorn_core::HandGesture;

/// Default landmark-model input size when the model does not declare one.
pub const DEFAULT_LANDMARK_INPUT: u32 = 224;
/// Minimum hand-presence score for a landmark detection.
pub const HAND_PRESENCE_THRESHOLD: f32 = 0.5;

/// Which path `detect` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    /// Not initialized yet.
    Off,
    /// Skin-colour heuristic.
    Heuristic,
    /// 21-landmark model.
    Model,
}

pub struct GestureEstimator {
    mode: GestureMode,
    #[cfg(feature = "onnx")]
    session: Option<Session>,
    input_size: (u32, u32),
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    num_threads: usize,
    last_detection_ms: f64,
    throttle: ErrorThrottle,
    epoch: Instant,
}

impl GestureEstimator {
    pub fn new(num_threads: usize) -> Self {
        Self {
            mode: GestureMode::Off,
            #[cfg(feature = "onnx")]
            session: None,
            input_size: (DEFAULT_LANDMARK_INPUT, DEFAULT_LANDMARK_INPUT),
            num_threads,
            last_detection_ms: 0.0,
            throttle: ErrorThrottle::default(),
            epoch: Instant::now(),
        }
    }

    /// Load the landmark model, or fall back to the heuristic. Always leaves
    /// the estimator usable.
    pub fn initialize(&mut self, model_path: &Path) -> bool {
        match self.load_model(model_path) {
            Ok(()) => {
                log::info!(
                    "Gesture model loaded from {:?} (input {}x{})",
                    model_path,
                    self.input_size.0,
                    self.input_size.1
                );
                self.mode = GestureMode::Model;
            }
            Err(e) => {
                log::warn!("Gesture model not available ({e}), using skin-colour heuristic");
                self.mode = GestureMode::Heuristic;
            }
        }
        true
    }

    #[cfg(feature = "onnx")]
    fn load_model(&mut self, model_path: &Path) -> Result<(), PerceptionError> {
        use ort::value::ValueType;

        let fail = |reason: String| PerceptionError::ModelLoadFailed {
            path: model_path.to_path_buf(),
            reason,
        };
        if !model_path.exists() {
            return Err(fail("file not found".into()));
        }
        let session = Session::builder()
            .map_err(|e| fail(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| fail(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(self.num_threads)
            .map_err(|e| fail(format!("failed to set thread count: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| fail(e.to_string()))?;

        // Declared input is [1, H, W, 3]; dynamic dims come back as -1.
        if let Some(input) = session.inputs.first() {
            if let ValueType::Tensor { shape, .. } = &input.input_type {
                if shape.len() == 4 && shape[1] > 0 && shape[2] > 0 {
                    self.input_size = (shape[2] as u32, shape[1] as u32);
                }
            }
        }
        self.session = Some(session);
        Ok(())
    }

    #[cfg(not(feature = "onnx"))]
    fn load_model(&mut self, model_path: &Path) -> Result<(), PerceptionError> {
        Err(PerceptionError::ModelLoadFailed {
            path: model_path.to_path_buf(),
            reason: "ONNX support not compiled".into(),
        })
    }

    /// Use the heuristic without attempting to load a model.
    pub fn initialize_heuristic(&mut self) {
        self.mode = GestureMode::Heuristic;
    }

    pub fn is_initialized(&self) -> bool {
        self.mode != GestureMode::Off
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn last_detection_time_ms(&self) -> f64 {
        self.last_detection_ms
    }

    /// Per-hand gesture flags for `frame`.
    pub fn detect(&mut self, frame: &Frame) -> GestureResult {
        let start = Instant::now();
        let mut result = match self.mode {
            GestureMode::Off => GestureResult::default(),
            GestureMode::Heuristic => crate::skin::detect_hands(frame),
            GestureMode::Model => match self.detect_model(frame) {
                Ok(r) => r,
                Err(e) => {
                    if self.throttle.record() {
                        log::error!(
                            "Gesture inference failed ({} so far): {e}",
                            self.throttle.failures()
                        );
                    }
                    GestureResult::default()
                }
            },
        };
        self.last_detection_ms = start.elapsed().as_secs_f64() * 1000.0;
        result.timestamp_ms = frame.captured_at.duration_since(self.epoch).as_secs_f64() * 1000.0;
        result
    }

    #[cfg(feature = "onnx")]
    fn detect_model(&mut self, frame: &Frame) -> Result<GestureResult, PerceptionError> {
        use ndarray::Array4;
        use ort::value::Tensor;

        let (w, h) = self.input_size;
        let rgb = crate::image_ops::frame_to_rgb_resized(frame, w, h);
        let pixels: Vec<f32> = rgb.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
        let input = Array4::from_shape_vec((1, h as usize, w as usize, 3), pixels)
            .map_err(|e| PerceptionError::Inference(e.to_string()))?;
        let tensor =
            Tensor::from_array(input).map_err(|e| PerceptionError::Inference(e.to_string()))?;

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| PerceptionError::Inference("session not loaded".into()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| PerceptionError::Inference(e.to_string()))?;

        let raw: Vec<f32> = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| PerceptionError::Inference(e.to_string()))?
            .iter()
            .copied()
            .collect();
        let presence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|a| a.iter().next().copied())
                .unwrap_or(1.0)
        } else {
            1.0
        };

        let mut result = GestureResult::default();
        if presence < HAND_PRESENCE_THRESHOLD {
            return Ok(result);
        }
        let landmarks = parse_landmarks(&raw, w, h).ok_or_else(|| {
            PerceptionError::BadOutputShape {
                expected: "[1, 63]".into(),
                actual: vec![raw.len()],
            }
        })?;

        let cx = landmarks.iter().map(|l| l.x).sum::<f32>() / landmarks.len() as f32;
        let cy = landmarks.iter().map(|l| l.y).sum::<f32>() / landmarks.len() as f32;
        let hand = HandGesture::detected(
            cx * frame.width as f32,
            cy * frame.height as f32,
            is_ok_gesture(&landmarks),
            presence,
        );
        if cx < 0.5 {
            result.right = hand;
        } else {
            result.left = hand;
        }
        Ok(result)
    }

    #[cfg(not(feature = "onnx"))]
    fn detect_model(&mut self, _frame: &Frame) -> Result<GestureResult, PerceptionError> {
        Err(PerceptionError::Inference("ONNX support not compiled".into()))
    }
}

impl Default for GestureEstimator {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_falls_back_to_heuristic() {
        let mut est = GestureEstimator::default();
        assert!(!est.is_initialized());
        assert!(est.initialize(Path::new("/no/such/hand_landmarker.task")));
        assert!(est.is_initialized());
        assert_eq!(est.mode(), GestureMode::Heuristic);
    }

    #[test]
    fn test_uninitialized_detects_nothing() {
        let mut est = GestureEstimator::default();
        let frame = Frame::solid(64, 64, [140, 170, 220]);
        let r = est.detect(&frame);
        assert!(!r.any_detected());
    }

    #[test]
    fn test_ok_implies_detected() {
        let mut est = GestureEstimator::default();
        est.initialize_heuristic();
        let frame = Frame::solid(320, 240, [140, 170, 220]);
        let r = est.detect(&frame);
        if r.left.is_ok {
            assert!(r.left.detected);
        }
        if r.right.is_ok {
            assert!(r.right.detected);
        }
        assert!(est.last_detection_time_ms() >= 0.0);
    }
}
