//! MoveNet single-person pose estimation.
//!
//! Input: `[1, H, W, 3]` int32 RGB pixels (0–255). Output: `[1, 1, 17, 3]`
//! with rows `[y, x, confidence]` normalised to the input image.

use std::path::Path;
use std::time::Instant;

use popcorn_core::person::DEFAULT_CONF_THRESHOLD;
use popcorn_core::{Frame, Keypoint, KeypointIndex, PerceptionError, Person, NUM_KEYPOINTS};

use crate::ErrorThrottle;

#[cfg(feature = "onnx")]
use ort::session::{builder::GraphOptimizationLevel, Session};

/// Pose estimator settings.
#[derive(Debug, Clone)]
pub struct PoseConfig {
    /// Model input size `[width, height]`.
    pub input_size: [u32; 2],
    pub confidence_threshold: f32,
    pub num_threads: usize,
}

impl PoseConfig {
    /// MoveNet Lightning defaults.
    pub fn movenet_lightning() -> Self {
        Self {
            input_size: [192, 192],
            confidence_threshold: DEFAULT_CONF_THRESHOLD,
            num_threads: 4,
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self::movenet_lightning()
    }
}

/// Pose estimator. Callable whether or not a model is loaded.
pub struct PoseEstimator {
    config: PoseConfig,
    #[cfg(feature = "onnx")]
    session: Option<Session>,
    initialized: bool,
    last_detection_ms: f64,
    throttle: ErrorThrottle,
}

impl PoseEstimator {
    pub fn new(config: PoseConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "onnx")]
            session: None,
            initialized: false,
            last_detection_ms: 0.0,
            throttle: ErrorThrottle::default(),
        }
    }

    /// Load the model, degrading to an uninitialized estimator on failure.
    pub fn initialize(&mut self, model_path: &Path) -> bool {
        match self.try_initialize(model_path) {
            Ok(()) => {
                log::info!("Pose model loaded from {:?}", model_path);
                true
            }
            Err(e) => {
                log::warn!("Pose model not available: {e}. Running without pose detection.");
                false
            }
        }
    }

    /// Load the model, failing with `ModelLoadFailed` when it is unusable.
    pub fn try_initialize(&mut self, model_path: &Path) -> Result<(), PerceptionError> {
        if !model_path.exists() {
            return Err(PerceptionError::ModelLoadFailed {
                path: model_path.to_path_buf(),
                reason: "file not found".into(),
            });
        }
        self.load_model(model_path)?;
        self.initialized = true;
        Ok(())
    }

    #[cfg(feature = "onnx")]
    fn load_model(&mut self, model_path: &Path) -> Result<(), PerceptionError> {
        let fail = |reason: String| PerceptionError::ModelLoadFailed {
            path: model_path.to_path_buf(),
            reason,
        };
        let session = Session::builder()
            .map_err(|e| fail(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| fail(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(self.config.num_threads)
            .map_err(|e| fail(format!("failed to set thread count: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| fail(e.to_string()))?;
        self.session = Some(session);
        Ok(())
    }

    #[cfg(not(feature = "onnx"))]
    fn load_model(&mut self, model_path: &Path) -> Result<(), PerceptionError> {
        Err(PerceptionError::ModelLoadFailed {
            path: model_path.to_path_buf(),
            reason: "ONNX support not compiled (enable the `onnx` feature)".into(),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Wall time of the last `detect` call.
    pub fn last_detection_time_ms(&self) -> f64 {
        self.last_detection_ms
    }

    /// Detect persons in `frame`. Empty when uninitialized or on a failed
    /// inference.
    pub fn detect(&mut self, frame: &Frame) -> Vec<Person> {
        if !self.initialized {
            return Vec::new();
        }
        let start = Instant::now();
        let result = self.run(frame);
        self.last_detection_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(output) => decode_movenet(
                &output,
                frame.width,
                frame.height,
                self.config.confidence_threshold,
            )
            .into_iter()
            .collect(),
            Err(e) => {
                if self.throttle.record() {
                    log::error!(
                        "Pose inference failed ({} so far): {e}",
                        self.throttle.failures()
                    );
                }
                Vec::new()
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn run(&mut self, frame: &Frame) -> Result<Vec<f32>, PerceptionError> {
        use ndarray::Array4;
        use ort::value::Tensor;

        let [w, h] = self.config.input_size;
        let pixels = preprocess(frame, w, h);
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
        let view: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .map_err(|e| PerceptionError::Inference(e.to_string()))?;

        let shape = view.shape().to_vec();
        if view.len() != NUM_KEYPOINTS * 3 {
            return Err(PerceptionError::BadOutputShape {
                expected: "[1, 1, 17, 3]".into(),
                actual: shape,
            });
        }
        Ok(view.iter().copied().collect())
    }

    #[cfg(not(feature = "onnx"))]
    fn run(&mut self, _frame: &Frame) -> Result<Vec<f32>, PerceptionError> {
        Err(PerceptionError::Inference("ONNX support not compiled".into()))
    }
}

/// BGR frame → packed `[H, W, 3]` RGB pixels as int32, resized to the model
/// input.
pub fn preprocess(frame: &Frame, width: u32, height: u32) -> Vec<i32> {
    let rgb = crate::image_ops::frame_to_rgb_resized(frame, width, height);
    rgb.into_raw().into_iter().map(i32::from).collect()
}

/// Decode a flattened `[17 × (y, x, conf)]` output into at most one person,
/// denormalised to `frame_w`×`frame_h` pixels.
pub fn decode_movenet(output: &[f32], frame_w: u32, frame_h: u32, threshold: f32) -> Option<Person> {
    if output.len() < NUM_KEYPOINTS * 3 {
        return None;
    }
    let mut keypoints = [Keypoint::missing(); NUM_KEYPOINTS];
    for (i, kp) in keypoints.iter_mut().enumerate() {
        let y = output[i * 3];
        let x = output[i * 3 + 1];
        let conf = output[i * 3 + 2];
        *kp = Keypoint::new(x * frame_w as f32, y * frame_h as f32, conf, threshold);
    }
    let person = Person::new(0, keypoints);
    let usable = person.keypoint(KeypointIndex::LeftWrist).valid
        || person.keypoint(KeypointIndex::RightWrist).valid
        || person.shoulder_center().valid;
    usable.then_some(person)
}
