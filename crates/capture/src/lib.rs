//! Camera frame source.
//!
//! A dedicated capture thread reads frames from a [`CameraDevice`] and
//! overwrites a single-slot buffer behind a mutex. The consumer copies the
//! latest frame out on demand; frames are never queued, so a slow consumer
//! always sees the freshest image.

pub mod device;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use popcorn_core::{CaptureError, Frame};

pub use device::{default_device, CameraDevice};

/// Back-off after a failed read.
pub const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Target capture rate requested from the device.
pub const TARGET_FPS: f64 = 30.0;

/// Shared between the capture thread and the consumer.
struct Shared {
    latest: Mutex<Option<Frame>>,
    running: AtomicBool,
    frames_captured: AtomicU64,
    read_failures: AtomicU64,
}

/// Owns the capture thread and the latest-frame slot.
pub struct FrameSource {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
    width: u32,
    height: u32,
}

impl FrameSource {
    /// Open the default camera backend and start capturing.
    pub fn initialize(device_id: i32, width: u32, height: u32) -> Result<Self, CaptureError> {
        let device = default_device()?;
        Self::with_device(device, device_id, width, height, TARGET_FPS)
    }

    /// Open `device` and start the capture thread.
    pub fn with_device(
        mut device: Box<dyn CameraDevice>,
        device_id: i32,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Self, CaptureError> {
        let (actual_w, actual_h) = device.open(device_id, width, height, fps)?;
        log::info!(
            "Camera {} ({}) opened: requested {}x{}, negotiated {}x{}",
            device_id,
            device.name(),
            width,
            height,
            actual_w,
            actual_h
        );

        let shared = Arc::new(Shared {
            latest: Mutex::new(None),
            running: AtomicBool::new(true),
            frames_captured: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || capture_loop(device, thread_shared, actual_w, actual_h))?;

        Ok(Self {
            shared,
            handle: Some(handle),
            width: actual_w,
            height: actual_h,
        })
    }

    /// Snapshot copy of the most recent frame, or `None` if nothing has
    /// arrived yet. Never blocks waiting for a frame.
    pub fn get_frame(&self) -> Option<Frame> {
        let slot = match self.shared.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.clone()
    }

    /// Negotiated frame size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames_captured(&self) -> u64 {
        self.shared.frames_captured.load(Ordering::Relaxed)
    }

    pub fn read_failures(&self) -> u64 {
        self.shared.read_failures.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.shared.running.load(Ordering::Acquire)
    }

    /// Stop the capture thread, join it, and release the device.
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Capture thread panicked");
            }
            log::info!(
                "Camera released after {} frames ({} read failures)",
                self.frames_captured(),
                self.read_failures()
            );
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn capture_loop(mut device: Box<dyn CameraDevice>, shared: Arc<Shared>, width: u32, height: u32) {
    while shared.running.load(Ordering::Acquire) {
        match device.read() {
            Ok(frame) if frame.width == width && frame.height == height => {
                let mut slot = match shared.latest.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *slot = Some(frame);
                drop(slot);
                shared.frames_captured.fetch_add(1, Ordering::Relaxed);
            }
            Ok(frame) => {
                log::debug!(
                    "Dropping {}x{} frame (negotiated {}x{})",
                    frame.width,
                    frame.height,
                    width,
                    height
                );
                shared.read_failures.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(READ_RETRY_DELAY);
            }
            Err(e) => {
                log::trace!("Camera read failed: {e}");
                shared.read_failures.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(READ_RETRY_DELAY);
            }
        }
    }
    device.release();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    /// Scripted device: fails every `fail_every`-th read, tags frames with a
    /// counter in the first pixel.
    struct ScriptedCamera {
        size: (u32, u32),
        open_ok: bool,
        reads: u32,
        fail_every: u32,
        released: Arc<AtomicBool>,
    }

    impl ScriptedCamera {
        fn new(size: (u32, u32)) -> (Self, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            (
                Self {
                    size,
                    open_ok: true,
                    reads: 0,
                    fail_every: 0,
                    released: released.clone(),
                },
                released,
            )
        }
    }

    impl CameraDevice for ScriptedCamera {
        fn open(
            &mut self,
            device_id: i32,
            _width: u32,
            _height: u32,
            _fps: f64,
        ) -> Result<(u32, u32), CaptureError> {
            if !self.open_ok {
                return Err(CaptureError::DeviceOpenFailed {
                    device_id,
                    reason: "scripted failure".into(),
                });
            }
            Ok(self.size)
        }

        fn read(&mut self) -> Result<Frame, String> {
            self.reads += 1;
            std::thread::sleep(Duration::from_millis(1));
            if self.fail_every > 0 && self.reads % self.fail_every == 0 {
                return Err("scripted read failure".into());
            }
            let mut f = Frame::solid(self.size.0, self.size.1, [0, 0, 0]);
            f.set_bgr(0, 0, [(self.reads % 256) as u8, 0, 0]);
            Ok(f)
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn wait_for_frame(source: &FrameSource) -> Option<Frame> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(f) = source.get_frame() {
                return Some(f);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn test_open_failure_is_reported() {
        let (mut cam, _) = ScriptedCamera::new((4, 4));
        cam.open_ok = false;
        let result = FrameSource::with_device(Box::new(cam), 3, 4, 4, 30.0);
        assert!(matches!(
            result,
            Err(CaptureError::DeviceOpenFailed { device_id: 3, .. })
        ));
    }

    #[test]
    fn test_frames_arrive_with_negotiated_size() {
        let (cam, _) = ScriptedCamera::new((16, 8));
        let source = FrameSource::with_device(Box::new(cam), 0, 1280, 720, 30.0).unwrap();
        assert_eq!(source.size(), (16, 8));
        let frame = wait_for_frame(&source).expect("no frame within 2s");
        assert_eq!((frame.width, frame.height), (16, 8));
    }

    #[test]
    fn test_read_failures_are_absorbed() {
        let (mut cam, _) = ScriptedCamera::new((4, 4));
        cam.fail_every = 2;
        let mut source = FrameSource::with_device(Box::new(cam), 0, 4, 4, 30.0).unwrap();
        assert!(wait_for_frame(&source).is_some());
        std::thread::sleep(Duration::from_millis(50));
        assert!(source.is_running());
        assert!(source.read_failures() > 0);
        source.shutdown();
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let (cam, _) = ScriptedCamera::new((4, 4));
        let source = FrameSource::with_device(Box::new(cam), 0, 4, 4, 30.0).unwrap();
        let mut a = wait_for_frame(&source).unwrap();
        a.set_bgr(1, 1, [255, 255, 255]);
        let b = source.get_frame().unwrap();
        assert_eq!(b.bgr_at(1, 1), [0, 0, 0]);
    }

    #[test]
    fn test_shutdown_joins_and_releases() {
        let (cam, released) = ScriptedCamera::new((4, 4));
        let mut source = FrameSource::with_device(Box::new(cam), 0, 4, 4, 30.0).unwrap();
        assert!(wait_for_frame(&source).is_some());
        source.shutdown();
        assert!(released.load(Ordering::SeqCst));
        assert!(!source.is_running());
        // Second shutdown is a no-op.
        source.shutdown();
    }

    #[test]
    fn test_single_slot_overwrites() {
        let (cam, _) = ScriptedCamera::new((4, 4));
        let source = FrameSource::with_device(Box::new(cam), 0, 4, 4, 30.0).unwrap();
        let first = wait_for_frame(&source).unwrap().bgr_at(0, 0)[0];
        std::thread::sleep(Duration::from_millis(30));
        let later = source.get_frame().unwrap().bgr_at(0, 0)[0];
        assert_ne!(first, later);
        assert!(source.frames_captured() > 1);
    }
}
