//! Frame timing: clamped delta time, an FPS counter, and the 60 Hz deadline.

use std::time::{Duration, Instant};

pub const TARGET_FPS: f64 = 60.0;

/// Cap on a single step so a stall (window drag, debugger) cannot teleport items.
pub const MAX_FRAME_TIME: f32 = 0.1;

pub fn target_frame_time() -> Duration {
    Duration::from_secs_f64(1.0 / TARGET_FPS)
}

pub struct FrameClock {
    last_frame: Instant,
    frame_count: u32,
    fps_timer: Instant,
    fps: f32,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame: now,
            frame_count: 0,
            fps_timer: now,
            fps: 0.0,
        }
    }

    /// Seconds since the previous tick, clamped to [`MAX_FRAME_TIME`].
    pub fn tick(&mut self, now: Instant) -> f32 {
        let raw_dt = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        raw_dt.min(MAX_FRAME_TIME)
    }

    /// Count a rendered frame. Returns the new FPS figure once per second.
    pub fn frame_done(&mut self, now: Instant) -> Option<f32> {
        self.frame_count += 1;
        let elapsed = now.saturating_duration_since(self.fps_timer).as_secs_f32();
        if elapsed < 1.0 {
            return None;
        }
        self.fps = self.frame_count as f32 / elapsed;
        self.frame_count = 0;
        self.fps_timer = now;
        Some(self.fps)
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// When the next frame should start: one period after `frame_start`, or
/// immediately if this frame already overran.
pub fn next_deadline(frame_start: Instant, now: Instant, period: Duration) -> Instant {
    let elapsed = now.saturating_duration_since(frame_start);
    if elapsed >= period {
        now
    } else {
        frame_start + period
    }
}
