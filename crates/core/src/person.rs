//! Skeletal keypoints and detected persons (MoveNet 17-point convention).

use nalgebra::Point2;

/// Number of keypoints per person.
pub const NUM_KEYPOINTS: usize = 17;

/// Default confidence threshold for a keypoint to count as valid.
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.3;

/// MoveNet keypoint indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const NAMES: [&'static str; NUM_KEYPOINTS] = [
        "nose",
        "left_eye",
        "right_eye",
        "left_ear",
        "right_ear",
        "left_shoulder",
        "right_shoulder",
        "left_elbow",
        "right_elbow",
        "left_wrist",
        "right_wrist",
        "left_hip",
        "right_hip",
        "left_knee",
        "right_knee",
        "left_ankle",
        "right_ankle",
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

/// A 2D keypoint in pixel coordinates with a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
    /// `confidence >= threshold`, fixed at detection time.
    pub valid: bool,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32, threshold: f32) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            x,
            y,
            confidence,
            valid: confidence >= threshold,
        }
    }

    /// Invalid keypoint at the origin.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }

    /// Componentwise midpoint; valid only when both parents are valid.
    pub fn midpoint(a: &Keypoint, b: &Keypoint) -> Keypoint {
        Keypoint {
            x: (a.x + b.x) * 0.5,
            y: (a.y + b.y) * 0.5,
            confidence: (a.confidence + b.confidence) * 0.5,
            valid: a.valid && b.valid,
        }
    }
}

/// One detected individual.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: u32,
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl Person {
    pub fn new(id: u32, keypoints: [Keypoint; NUM_KEYPOINTS]) -> Self {
        Self { id, keypoints }
    }

    /// Person with only the two wrists set (all other keypoints missing).
    pub fn with_wrists(id: u32, left: Keypoint, right: Keypoint) -> Self {
        let mut keypoints = [Keypoint::missing(); NUM_KEYPOINTS];
        keypoints[KeypointIndex::LeftWrist as usize] = left;
        keypoints[KeypointIndex::RightWrist as usize] = right;
        Self { id, keypoints }
    }

    #[inline]
    pub fn keypoint(&self, idx: KeypointIndex) -> &Keypoint {
        &self.keypoints[idx as usize]
    }

    pub fn head(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::Nose)
    }

    pub fn left_wrist(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::LeftWrist)
    }

    pub fn right_wrist(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::RightWrist)
    }

    pub fn left_shoulder(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::LeftShoulder)
    }

    pub fn right_shoulder(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::RightShoulder)
    }

    pub fn left_elbow(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::LeftElbow)
    }

    pub fn right_elbow(&self) -> &Keypoint {
        self.keypoint(KeypointIndex::RightElbow)
    }

    pub fn shoulder_center(&self) -> Keypoint {
        Keypoint::midpoint(self.left_shoulder(), self.right_shoulder())
    }

    pub fn hip_center(&self) -> Keypoint {
        Keypoint::midpoint(
            self.keypoint(KeypointIndex::LeftHip),
            self.keypoint(KeypointIndex::RightHip),
        )
    }

    /// Whether this detection carries anything the game can use.
    pub fn is_usable(&self) -> bool {
        self.left_wrist().valid || self.right_wrist().valid || self.shoulder_center().valid
    }

    /// Best available torso anchor: shoulder center, then hip center.
    pub fn torso(&self) -> Option<Keypoint> {
        let shoulders = self.shoulder_center();
        if shoulders.valid {
            return Some(shoulders);
        }
        let hips = self.hip_center();
        hips.valid.then_some(hips)
    }

    /// Rescale every keypoint from one pixel space into another.
    pub fn scaled(&self, sx: f32, sy: f32) -> Person {
        let mut out = self.clone();
        for kp in out.keypoints.iter_mut() {
            kp.x *= sx;
            kp.y *= sy;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_threshold_is_inclusive() {
        assert!(Keypoint::new(0.0, 0.0, 0.3, 0.3).valid);
        assert!(!Keypoint::new(0.0, 0.0, 0.29, 0.3).valid);
    }

    #[test]
    fn test_shoulder_center_requires_both() {
        let mut kps = [Keypoint::missing(); NUM_KEYPOINTS];
        kps[5] = Keypoint::new(100.0, 200.0, 0.9, 0.3);
        kps[6] = Keypoint::new(300.0, 220.0, 0.1, 0.3);
        let p = Person::new(0, kps);
        let c = p.shoulder_center();
        assert!(!c.valid);
        assert!((c.x - 200.0).abs() < 1e-4);
        assert!((c.y - 210.0).abs() < 1e-4);
        assert!(!p.is_usable());
    }

    #[test]
    fn test_torso_falls_back_to_hips() {
        let mut kps = [Keypoint::missing(); NUM_KEYPOINTS];
        kps[11] = Keypoint::new(10.0, 10.0, 0.8, 0.3);
        kps[12] = Keypoint::new(30.0, 10.0, 0.8, 0.3);
        let p = Person::new(1, kps);
        let t = p.torso().unwrap();
        assert_eq!(t.x, 20.0);
    }

    #[test]
    fn test_scaled() {
        let p = Person::with_wrists(
            0,
            Keypoint::new(640.0, 360.0, 0.9, 0.3),
            Keypoint::missing(),
        );
        let s = p.scaled(1.5, 1.5);
        assert_eq!(s.left_wrist().x, 960.0);
        assert_eq!(s.left_wrist().y, 540.0);
        assert!(s.left_wrist().valid);
        assert!(s.is_usable());
    }

    #[test]
    fn test_keypoint_names() {
        assert_eq!(KeypointIndex::RightWrist.name(), "right_wrist");
        assert_eq!(KeypointIndex::Nose.name(), "nose");
    }
}
