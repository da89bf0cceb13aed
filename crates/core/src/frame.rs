//! Captured camera frames.

use std::time::Instant;

/// Bytes per pixel of a [`Frame`] (B, G, R).
pub const FRAME_CHANNELS: usize = 3;

/// A timestamped 8-bit BGR image.
///
/// Rows are tightly packed (`stride == width * 3`).
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Monotonic capture timestamp.
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap a packed BGR buffer. Returns `None` when the buffer length does not
    /// match the dimensions or a dimension is zero.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if data.len() != width as usize * height as usize * FRAME_CHANNELS {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
            captured_at: Instant::now(),
        })
    }

    /// A frame filled with a single BGR colour.
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let n = width as usize * height as usize;
        let mut data = Vec::with_capacity(n * FRAME_CHANNELS);
        for _ in 0..n {
            data.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            data,
            captured_at: Instant::now(),
        }
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * FRAME_CHANNELS
    }

    /// BGR triple at (x, y). Panics when out of bounds.
    #[inline]
    pub fn bgr_at(&self, x: u32, y: u32) -> [u8; 3] {
        let i = y as usize * self.stride() + x as usize * FRAME_CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Overwrite the pixel at (x, y) with a BGR triple.
    #[inline]
    pub fn set_bgr(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        let i = y as usize * self.stride() + x as usize * FRAME_CHANNELS;
        self.data[i..i + FRAME_CHANNELS].copy_from_slice(&bgr);
    }

    /// Row `y` as a packed BGR slice.
    pub fn row(&self, y: u32) -> &[u8] {
        let s = self.stride();
        let start = y as usize * s;
        &self.data[start..start + s]
    }

    /// Milliseconds since capture.
    pub fn age_ms(&self) -> f64 {
        self.captured_at.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bgr_rejects_bad_len() {
        assert!(Frame::from_bgr(4, 4, vec![0; 10]).is_none());
        assert!(Frame::from_bgr(0, 4, vec![]).is_none());
        assert!(Frame::from_bgr(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn test_pixel_access() {
        let mut f = Frame::solid(8, 4, [1, 2, 3]);
        assert_eq!(f.bgr_at(7, 3), [1, 2, 3]);
        f.set_bgr(2, 1, [9, 8, 7]);
        assert_eq!(f.bgr_at(2, 1), [9, 8, 7]);
        assert_eq!(f.row(1)[6..9], [9, 8, 7]);
        assert_eq!(f.row(0).len(), 24);
    }
}
