//! Perception: camera frame → persons (pose) and per-hand OK flags (gesture).
//!
//! Both estimators keep the same contract whether or not a model is loaded.
//! A missing pose model yields empty detections; a missing gesture model
//! switches to a skin-colour heuristic.

pub mod gesture;
pub mod image_ops;
pub mod landmarks;
pub mod pose;
pub mod skin;

pub use gesture::{GestureEstimator, GestureMode};
pub use pose::{PoseConfig, PoseEstimator};

/// Log one line for the first failure, then one per `every` failures.
#[derive(Debug, Clone)]
pub struct ErrorThrottle {
    failures: u64,
    every: u64,
}

/// Default spacing for repeated perception failure logs.
pub const PERCEPTION_LOG_EVERY: u64 = 120;

impl ErrorThrottle {
    pub fn new(every: u64) -> Self {
        Self {
            failures: 0,
            every: every.max(1),
        }
    }

    /// Record a failure; true when this one should be logged.
    pub fn record(&mut self) -> bool {
        let log_it = self.failures % self.every == 0;
        self.failures += 1;
        log_it
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl Default for ErrorThrottle {
    fn default() -> Self {
        Self::new(PERCEPTION_LOG_EVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_logs_first_then_every_n() {
        let mut t = ErrorThrottle::new(3);
        let logged: Vec<bool> = (0..7).map(|_| t.record()).collect();
        assert_eq!(logged, vec![true, false, false, true, false, false, true]);
        assert_eq!(t.failures(), 7);
    }
}
