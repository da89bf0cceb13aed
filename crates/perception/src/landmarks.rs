//! 21-point hand landmarks and the OK-sign predicate.

/// Number of hand landmarks.
pub const NUM_HAND_LANDMARKS: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// Thumb–index tip distance (normalised units) below which they "touch".
pub const OK_PINCH_DISTANCE: f32 = 0.08;
/// Extended fingers required among middle, ring, and pinky.
pub const OK_MIN_EXTENDED: usize = 2;

/// A landmark in model-normalised space (x, y in [0, 1], z relative depth).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Thumb and index tips touching with at least two other fingers extended
/// (tip above its MCP joint in image space).
pub fn is_ok_gesture(lm: &[Landmark; NUM_HAND_LANDMARKS]) -> bool {
    let pinch = lm[THUMB_TIP].distance(&lm[INDEX_TIP]) < OK_PINCH_DISTANCE;
    let extended = [(MIDDLE_TIP, MIDDLE_MCP), (RING_TIP, RING_MCP), (PINKY_TIP, PINKY_MCP)]
        .iter()
        .filter(|&&(tip, mcp)| lm[tip].y < lm[mcp].y)
        .count();
    pinch && extended >= OK_MIN_EXTENDED
}

/// Parse a flattened `21 × (x, y, z)` model output given in input pixels,
/// normalising by the model input size.
pub fn parse_landmarks(
    raw: &[f32],
    input_w: u32,
    input_h: u32,
) -> Option<[Landmark; NUM_HAND_LANDMARKS]> {
    if raw.len() < NUM_HAND_LANDMARKS * 3 || input_w == 0 || input_h == 0 {
        return None;
    }
    let (w, h) = (input_w as f32, input_h as f32);
    let mut out = [Landmark::default(); NUM_HAND_LANDMARKS];
    for (i, lm) in out.iter_mut().enumerate() {
        *lm = Landmark::new(raw[i * 3] / w, raw[i * 3 + 1] / h, raw[i * 3 + 2] / w);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Upright hand: fingertips above MCPs (smaller y), thumb and index apart.
    fn open_hand() -> [Landmark; NUM_HAND_LANDMARKS] {
        let mut lm = [Landmark::new(0.5, 0.8, 0.0); NUM_HAND_LANDMARKS];
        lm[THUMB_TIP] = Landmark::new(0.35, 0.5, 0.0);
        lm[INDEX_TIP] = Landmark::new(0.45, 0.3, 0.0);
        for (tip, mcp, x) in [
            (MIDDLE_TIP, MIDDLE_MCP, 0.5),
            (RING_TIP, RING_MCP, 0.55),
            (PINKY_TIP, PINKY_MCP, 0.6),
        ] {
            lm[mcp] = Landmark::new(x, 0.6, 0.0);
            lm[tip] = Landmark::new(x, 0.35, 0.0);
        }
        lm
    }

    #[test]
    fn test_open_hand_is_not_ok() {
        assert!(!is_ok_gesture(&open_hand()));
    }

    #[test]
    fn test_pinch_with_extended_fingers_is_ok() {
        let mut lm = open_hand();
        lm[INDEX_TIP] = Landmark::new(0.37, 0.52, 0.01);
        assert!(is_ok_gesture(&lm));
    }

    #[test]
    fn test_pinch_with_curled_fingers_is_not_ok() {
        let mut lm = open_hand();
        lm[INDEX_TIP] = Landmark::new(0.37, 0.52, 0.0);
        // Curl ring and pinky below their MCPs.
        lm[RING_TIP].y = 0.7;
        lm[PINKY_TIP].y = 0.7;
        assert!(!is_ok_gesture(&lm));
        // One more finger extended brings it back to two.
        lm[RING_TIP].y = 0.4;
        assert!(is_ok_gesture(&lm));
    }

    #[test]
    fn test_pinch_distance_uses_depth() {
        let mut lm = open_hand();
        lm[INDEX_TIP] = Landmark::new(0.35, 0.5, 0.1);
        assert!(!is_ok_gesture(&lm));
    }

    #[test]
    fn test_parse_landmarks_normalises() {
        let mut raw = vec![0.0f32; 63];
        raw[THUMB_TIP * 3] = 112.0;
        raw[THUMB_TIP * 3 + 1] = 56.0;
        let lm = parse_landmarks(&raw, 224, 224).unwrap();
        assert!((lm[THUMB_TIP].x - 0.5).abs() < 1e-6);
        assert!((lm[THUMB_TIP].y - 0.25).abs() < 1e-6);
        assert!(parse_landmarks(&raw[..30], 224, 224).is_none());
    }
}
