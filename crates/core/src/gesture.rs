//! Per-hand gesture flags emitted by the gesture estimator.

/// Gesture state of one hand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandGesture {
    pub detected: bool,
    pub is_ok: bool,
    /// Hand centre in frame pixels.
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl HandGesture {
    /// A detected hand. An OK flag on an undetected hand is never produced.
    pub fn detected(x: f32, y: f32, is_ok: bool, confidence: f32) -> Self {
        Self {
            detected: true,
            is_ok,
            x,
            y,
            confidence,
        }
    }
}

/// Both hands, keyed from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureResult {
    pub left: HandGesture,
    pub right: HandGesture,
    pub timestamp_ms: f64,
}

impl GestureResult {
    pub fn any_ok(&self) -> bool {
        (self.left.detected && self.left.is_ok) || (self.right.detected && self.right.is_ok)
    }

    pub fn any_detected(&self) -> bool {
        self.left.detected || self.right.detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_requires_detection() {
        let mut g = GestureResult::default();
        g.right.is_ok = true;
        assert!(!g.any_ok());
        g.right = HandGesture::detected(10.0, 10.0, true, 0.7);
        assert!(g.any_ok());
        assert!(g.any_detected());
    }
}
