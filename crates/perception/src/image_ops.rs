//! Frame ↔ `image` buffer conversions shared by both estimators.

use image::{imageops, RgbImage};
use popcorn_core::Frame;
use rayon::prelude::*;

/// BGR frame → RGB image.
pub fn frame_to_rgb(frame: &Frame) -> RgbImage {
    let mut rgb = vec![0u8; frame.data.len()];
    rgb.par_chunks_exact_mut(3)
        .zip(frame.data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
        });
    // Length matches width * height * 3 by construction of Frame.
    RgbImage::from_raw(frame.width, frame.height, rgb)
        .unwrap_or_else(|| RgbImage::new(frame.width, frame.height))
}

/// BGR frame → RGB image resized to `width`×`height` (nearest neighbour).
pub fn frame_to_rgb_resized(frame: &Frame, width: u32, height: u32) -> RgbImage {
    let rgb = frame_to_rgb(frame);
    if rgb.width() == width && rgb.height() == height {
        return rgb;
    }
    imageops::resize(&rgb, width, height, imageops::FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgr_to_rgb_swaps_channels() {
        let frame = Frame::solid(3, 2, [10, 20, 30]);
        let rgb = frame_to_rgb(&frame);
        assert_eq!(rgb.get_pixel(2, 1).0, [30, 20, 10]);
    }

    #[test]
    fn test_resize_dimensions() {
        let frame = Frame::solid(64, 48, [0, 0, 255]);
        let img = frame_to_rgb_resized(&frame, 16, 16);
        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0]);
    }
}
