//! Camera device abstraction and the OpenCV-backed implementation.

use popcorn_core::{CaptureError, Frame};

/// A camera the capture thread can drive.
///
/// `open` runs on the caller's thread; `read` and `release` run on the
/// capture thread.
pub trait CameraDevice: Send + 'static {
    /// Open the device and request a frame size and rate. Returns the size the
    /// device actually negotiated.
    fn open(
        &mut self,
        device_id: i32,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<(u32, u32), CaptureError>;

    /// Blocking read of one BGR frame. Errors are transient.
    fn read(&mut self) -> Result<Frame, String>;

    /// Release the device. Called once when the capture thread exits.
    fn release(&mut self);

    fn name(&self) -> &str;
}

/// Device for the backend compiled into this build.
pub fn default_device() -> Result<Box<dyn CameraDevice>, CaptureError> {
    #[cfg(feature = "opencv-backend")]
    {
        Ok(Box::new(opencv_backend::OpenCvCamera::new()))
    }
    #[cfg(not(feature = "opencv-backend"))]
    {
        Err(CaptureError::BackendUnavailable)
    }
}

#[cfg(feature = "opencv-backend")]
pub mod opencv_backend {
    use opencv::core::{Mat, CV_8UC3};
    use opencv::prelude::*;
    use opencv::videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH,
    };

    use super::CameraDevice;
    use popcorn_core::{CaptureError, Frame};

    /// `VideoCapture` wrapper.
    pub struct OpenCvCamera {
        capture: Option<VideoCapture>,
        mat: Mat,
    }

    impl OpenCvCamera {
        pub fn new() -> Self {
            Self {
                capture: None,
                mat: Mat::default(),
            }
        }
    }

    impl Default for OpenCvCamera {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CameraDevice for OpenCvCamera {
        fn open(
            &mut self,
            device_id: i32,
            width: u32,
            height: u32,
            fps: f64,
        ) -> Result<(u32, u32), CaptureError> {
            let open_err = |reason: String| CaptureError::DeviceOpenFailed { device_id, reason };

            let mut cap =
                VideoCapture::new(device_id, CAP_ANY).map_err(|e| open_err(e.to_string()))?;
            if !cap.is_opened().map_err(|e| open_err(e.to_string()))? {
                return Err(open_err("device did not open".into()));
            }

            // Requests only; the device may pick something else.
            let _ = cap.set(CAP_PROP_FRAME_WIDTH, width as f64);
            let _ = cap.set(CAP_PROP_FRAME_HEIGHT, height as f64);
            let _ = cap.set(CAP_PROP_FPS, fps);

            let actual_w = cap.get(CAP_PROP_FRAME_WIDTH).map_err(|e| open_err(e.to_string()))?;
            let actual_h = cap.get(CAP_PROP_FRAME_HEIGHT).map_err(|e| open_err(e.to_string()))?;
            if actual_w < 1.0 || actual_h < 1.0 {
                return Err(open_err(format!(
                    "device reported invalid size {actual_w}x{actual_h}"
                )));
            }

            self.capture = Some(cap);
            Ok((actual_w as u32, actual_h as u32))
        }

        fn read(&mut self) -> Result<Frame, String> {
            let cap = self.capture.as_mut().ok_or("device not open")?;
            let ok = cap.read(&mut self.mat).map_err(|e| e.to_string())?;
            if !ok || self.mat.empty() {
                return Err("empty frame".into());
            }
            if self.mat.typ() != CV_8UC3 {
                return Err(format!("unsupported mat type {}", self.mat.typ()));
            }
            let width = self.mat.cols() as u32;
            let height = self.mat.rows() as u32;
            let bytes = if self.mat.is_continuous() {
                self.mat.data_bytes().map_err(|e| e.to_string())?.to_vec()
            } else {
                let packed = self.mat.try_clone().map_err(|e| e.to_string())?;
                packed.data_bytes().map_err(|e| e.to_string())?.to_vec()
            };
            Frame::from_bgr(width, height, bytes).ok_or_else(|| "frame size mismatch".to_string())
        }

        fn release(&mut self) {
            if let Some(mut cap) = self.capture.take() {
                let _ = cap.release();
            }
        }

        fn name(&self) -> &str {
            "opencv"
        }
    }
}
