//! Skin-colour hand heuristic used when no hand-landmark model is loaded.
//!
//! Pipeline: BGR → HSV, threshold a skin range, clean the mask with a
//! 5×5 elliptical open/close, take the largest outer contours, and classify each
//! by its convexity defects and bounding-box aspect ratio.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::morphology::{grayscale_close, grayscale_open, Mask};
use imageproc::point::Point;
use popcorn_core::{Frame, GestureResult, HandGesture};
use rayon::prelude::*;

/// Inclusive HSV bounds in OpenCV 8-bit convention (H in 0..180).
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub lo: [u8; 3],
    pub hi: [u8; 3],
}

impl HsvRange {
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lo[i] && hsv[i] <= self.hi[i])
    }
}

pub const SKIN_RANGE: HsvRange = HsvRange {
    lo: [0, 20, 70],
    hi: [20, 255, 255],
};

/// Contours smaller than this (px²) are ignored.
pub const MIN_HAND_AREA: f64 = 5000.0;
pub const MAX_HANDS: usize = 2;
/// Defects deeper than this (px) count as gaps between fingers.
pub const DEEP_DEFECT_DEPTH: f32 = 20.0;
pub const OK_ASPECT_MIN: f32 = 0.5;
pub const OK_ASPECT_MAX: f32 = 2.0;
pub const HEURISTIC_CONFIDENCE: f32 = 0.7;
/// 5×5 elliptical structuring element, row by row.
const MORPH_ELLIPSE: [[u8; 5]; 5] = [
    [0, 0, 1, 0, 0],
    [1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1],
    [0, 0, 1, 0, 0],
];

/// BGR → HSV using OpenCV's 8-bit scaling (H halved into 0..180).
pub fn bgr_to_hsv(b: u8, g: u8, r: u8) -> [u8; 3] {
    let (bf, gf, rf) = (b as f32, g as f32, r as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = v - min;
    let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / delta
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }
    [
        (h / 2.0).round().min(179.0) as u8,
        s.round() as u8,
        v as u8,
    ]
}

/// Binary mask (255 = skin) of `frame`.
pub fn skin_mask(frame: &Frame, range: &HsvRange) -> GrayImage {
    let w = frame.width as usize;
    let mut mask = vec![0u8; w * frame.height as usize];
    mask.par_chunks_mut(w)
        .zip(frame.data.par_chunks(frame.stride()))
        .for_each(|(dst, src)| {
            for (out, px) in dst.iter_mut().zip(src.chunks_exact(3)) {
                let hsv = bgr_to_hsv(px[0], px[1], px[2]);
                *out = if range.contains(hsv) { 255 } else { 0 };
            }
        });
    GrayImage::from_raw(frame.width, frame.height, mask)
        .unwrap_or_else(|| GrayImage::new(frame.width, frame.height))
}

fn ellipse_kernel() -> Mask {
    let image = GrayImage::from_fn(5, 5, |x, y| {
        image::Luma([MORPH_ELLIPSE[y as usize][x as usize] * 255])
    });
    Mask::from_image(&image, 2, 2)
}

/// Morphological open then close with the elliptical kernel.
pub fn clean_mask(mask: &GrayImage) -> GrayImage {
    let kernel = ellipse_kernel();
    let opened = grayscale_open(mask, &kernel);
    grayscale_close(&opened, &kernel)
}

/// Polygon area (shoelace), always non-negative.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        acc += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (acc as f64 / 2.0).abs()
}

#[inline]
fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Convex hull of `points` as indices into `points`, sorted ascending.
pub fn convex_hull_indices(points: &[Point<i32>]) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (points[i].x, points[i].y));
    order.dedup_by_key(|i| (points[*i].x, points[*i].y));

    let mut hull: Vec<usize> = Vec::with_capacity(2 * order.len());
    // Lower chain.
    for &i in &order {
        while hull.len() >= 2
            && cross(points[hull[hull.len() - 2]], points[hull[hull.len() - 1]], points[i]) <= 0
        {
            hull.pop();
        }
        hull.push(i);
    }
    // Upper chain.
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(points[hull[hull.len() - 2]], points[hull[hull.len() - 1]], points[i]) <= 0
        {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();
    hull.sort_unstable();
    hull.dedup();
    hull
}

/// A concavity between two consecutive hull vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defect {
    pub start: usize,
    pub end: usize,
    pub farthest: usize,
    /// Distance (px) from the farthest point to the hull edge.
    pub depth: f32,
}

/// Convexity defects of a closed contour given its sorted hull indices.
pub fn convexity_defects(points: &[Point<i32>], hull: &[usize]) -> Vec<Defect> {
    let n = points.len();
    if n < 4 || hull.len() < 3 {
        return Vec::new();
    }
    let mut defects = Vec::new();
    for k in 0..hull.len() {
        let start = hull[k];
        let end = if k + 1 < hull.len() { hull[k + 1] } else { hull[0] + n };
        let a = points[start];
        let b = points[end % n];
        let (dx, dy) = ((b.x - a.x) as f32, (b.y - a.y) as f32);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f32::EPSILON {
            continue;
        }
        let mut best = (start, 0.0f32);
        for j in start + 1..end {
            let p = points[j % n];
            let d = ((p.x - a.x) as f32 * dy - (p.y - a.y) as f32 * dx).abs() / len;
            if d > best.1 {
                best = (j % n, d);
            }
        }
        if best.1 > 0.0 {
            defects.push(Defect {
                start,
                end: end % n,
                farthest: best.0,
                depth: best.1,
            });
        }
    }
    defects
}

/// One candidate hand region.
#[derive(Debug, Clone)]
pub struct HandBlob {
    pub area: f64,
    /// `(x, y, width, height)` of the bounding box.
    pub bbox: (i32, i32, i32, i32),
    pub deep_defects: usize,
}

impl HandBlob {
    pub fn center(&self) -> (f32, f32) {
        let (x, y, w, h) = self.bbox;
        (x as f32 + w as f32 / 2.0, y as f32 + h as f32 / 2.0)
    }

    pub fn aspect_ratio(&self) -> f32 {
        let (_, _, w, h) = self.bbox;
        if h == 0 {
            return f32::INFINITY;
        }
        w as f32 / h as f32
    }

    /// Thumb and index closed into a ring leaves 1–3 visible finger gaps.
    pub fn is_ok(&self) -> bool {
        let aspect = self.aspect_ratio();
        (1..=3).contains(&self.deep_defects) && (OK_ASPECT_MIN..=OK_ASPECT_MAX).contains(&aspect)
    }
}

fn bounding_box(points: &[Point<i32>]) -> (i32, i32, i32, i32) {
    let (mut x0, mut y0, mut x1, mut y1) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    (x0, y0, x1 - x0 + 1, y1 - y0 + 1)
}

/// Up to [`MAX_HANDS`] outer contours of at least [`MIN_HAND_AREA`], largest
/// first.
pub fn find_hand_blobs(mask: &GrayImage) -> Vec<HandBlob> {
    let mut blobs: Vec<HandBlob> = find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let area = contour_area(&c.points);
            if area < MIN_HAND_AREA {
                return None;
            }
            let hull = convex_hull_indices(&c.points);
            let deep_defects = convexity_defects(&c.points, &hull)
                .iter()
                .filter(|d| d.depth > DEEP_DEFECT_DEPTH)
                .count();
            Some(HandBlob {
                area,
                bbox: bounding_box(&c.points),
                deep_defects,
            })
        })
        .collect();
    blobs.sort_by(|a, b| b.area.total_cmp(&a.area));
    blobs.truncate(MAX_HANDS);
    blobs
}

/// Run the whole heuristic on one frame.
///
/// The display is mirrored, so a blob in the left half of the raw frame is
/// the user's right hand.
pub fn detect_hands(frame: &Frame) -> GestureResult {
    let mask = clean_mask(&skin_mask(frame, &SKIN_RANGE));
    let mut result = GestureResult::default();
    let half = frame.width as f32 / 2.0;
    for blob in find_hand_blobs(&mask) {
        let (cx, cy) = blob.center();
        let hand = HandGesture::detected(cx, cy, blob.is_ok(), HEURISTIC_CONFIDENCE);
        let slot = if cx < half {
            &mut result.right
        } else {
            &mut result.left
        };
        // Blobs arrive largest first; keep the larger one per side.
        if !slot.detected {
            *slot = hand;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIN_BGR: [u8; 3] = [140, 170, 220];
    const BACKGROUND_BGR: [u8; 3] = [200, 60, 20];

    fn fill_rect(frame: &mut Frame, x: u32, y: u32, w: u32, h: u32, bgr: [u8; 3]) {
        for yy in y..y + h {
            for xx in x..x + w {
                frame.set_bgr(xx, yy, bgr);
            }
        }
    }

    /// A 200×160 skin block with a 40×80 notch cut from the top.
    fn notched_hand(frame: &mut Frame, x: u32, y: u32) {
        fill_rect(frame, x, y, 200, 160, SKIN_BGR);
        fill_rect(frame, x + 80, y, 40, 80, BACKGROUND_BGR);
    }

    fn ellipse_blob(size: u32, cx: u32, cy: u32) -> GrayImage {
        let mut mask = GrayImage::new(size, size);
        for (dy, row) in MORPH_ELLIPSE.iter().enumerate() {
            for (dx, &on) in row.iter().enumerate() {
                if on == 1 {
                    mask.put_pixel(cx + dx as u32 - 2, cy + dy as u32 - 2, image::Luma([255]));
                }
            }
        }
        mask
    }

    fn lit(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] > 0).count()
    }

    #[test]
    fn test_ellipse_blob_survives_cleaning() {
        let mask = ellipse_blob(15, 7, 7);
        assert_eq!(lit(&mask), 17);
        let cleaned = clean_mask(&mask);
        assert_eq!(lit(&cleaned), 17);
        assert_eq!(cleaned, mask);
    }

    #[test]
    fn test_specks_removed_by_cleaning() {
        let mut mask = GrayImage::new(15, 15);
        for y in 6..9 {
            for x in 6..9 {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
        assert_eq!(lit(&clean_mask(&mask)), 0);
    }

    #[test]
    fn test_hsv_conversion() {
        assert_eq!(bgr_to_hsv(0, 0, 255), [0, 255, 255]);
        assert_eq!(bgr_to_hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(bgr_to_hsv(255, 0, 0), [120, 255, 255]);
        assert_eq!(bgr_to_hsv(128, 128, 128), [0, 0, 128]);
        let skin = bgr_to_hsv(SKIN_BGR[0], SKIN_BGR[1], SKIN_BGR[2]);
        assert!(SKIN_RANGE.contains(skin), "skin tone {:?} outside range", skin);
        let bg = bgr_to_hsv(BACKGROUND_BGR[0], BACKGROUND_BGR[1], BACKGROUND_BGR[2]);
        assert!(!SKIN_RANGE.contains(bg));
    }

    #[test]
    fn test_contour_area_square() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&pts), 100.0);
    }

    #[test]
    fn test_hull_of_square_with_dent() {
        // Square with one vertex pushed inward at index 2.
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(5, 3),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        let hull = convex_hull_indices(&pts);
        assert_eq!(hull, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_defect_depth() {
        // Walk a "U": top edge interrupted by a 6-deep notch.
        let pts = vec![
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 6),
            Point::new(6, 6),
            Point::new(6, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        let hull = convex_hull_indices(&pts);
        let defects = convexity_defects(&pts, &hull);
        let deepest = defects
            .iter()
            .map(|d| d.depth)
            .fold(0.0f32, f32::max);
        assert!((deepest - 6.0).abs() < 1e-4, "deepest = {deepest}");
    }

    #[test]
    fn test_blob_classification() {
        let ok = HandBlob {
            area: 9000.0,
            bbox: (0, 0, 100, 120),
            deep_defects: 2,
        };
        assert!(ok.is_ok());
        let fist = HandBlob { deep_defects: 0, ..ok.clone() };
        assert!(!fist.is_ok());
        let open_hand = HandBlob { deep_defects: 4, ..ok.clone() };
        assert!(!open_hand.is_ok());
        let arm = HandBlob { bbox: (0, 0, 300, 100), ..ok.clone() };
        assert!(!arm.is_ok());
        let edge = HandBlob { bbox: (0, 0, 200, 100), ..ok };
        assert!(edge.is_ok());
    }

    #[test]
    fn test_small_blobs_ignored() {
        let mut frame = Frame::solid(320, 240, BACKGROUND_BGR);
        fill_rect(&mut frame, 20, 20, 40, 40, SKIN_BGR);
        let result = detect_hands(&frame);
        assert!(!result.any_detected());
    }

    #[test]
    fn test_notched_blob_is_ok_and_mirrored() {
        let mut frame = Frame::solid(640, 480, BACKGROUND_BGR);
        notched_hand(&mut frame, 40, 100);
        let result = detect_hands(&frame);
        // Raw-frame left half → user's right hand.
        assert!(result.right.detected);
        assert!(result.right.is_ok);
        assert!(!result.left.detected);
        assert!(result.any_ok());
    }

    #[test]
    fn test_plain_block_is_not_ok() {
        let mut frame = Frame::solid(640, 480, BACKGROUND_BGR);
        fill_rect(&mut frame, 400, 100, 180, 160, SKIN_BGR);
        let result = detect_hands(&frame);
        assert!(result.left.detected);
        assert!(!result.left.is_ok);
        assert!(!result.any_ok());
    }
}
