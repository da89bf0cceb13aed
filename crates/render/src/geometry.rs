//! Screen-space math and unit meshes for the primitive pipeline.

use glam::Vec2;

/// Segments in the disk and ring meshes.
pub const CIRCLE_SEGMENTS: u32 = 32;

/// Corner of a unit mesh. `edge` selects between the instance's inner
/// radius (0) and the full radius (1).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub local: [f32; 2],
    pub edge: f32,
}

impl MeshVertex {
    const fn new(x: f32, y: f32, edge: f32) -> Self {
        Self { local: [x, y], edge }
    }
}

/// Pixel coordinates (origin top-left, y down) to normalized device
/// coordinates.
pub fn screen_to_ndc(p: Vec2, screen: Vec2) -> Vec2 {
    Vec2::new(p.x / screen.x * 2.0 - 1.0, 1.0 - p.y / screen.y * 2.0)
}

/// A pixel offset expressed as an NDC displacement.
pub fn pixel_offset_to_ndc(offset: Vec2, screen: Vec2) -> Vec2 {
    Vec2::new(offset.x * 2.0 / screen.x, -offset.y * 2.0 / screen.y)
}

/// Mirror a camera-space point for display.
pub fn to_display(x: f32, y: f32, screen_w: f32) -> Vec2 {
    Vec2::new(popcorn_core::mirror_x(x, screen_w), y)
}

fn circle_point(i: u32) -> (f32, f32) {
    let a = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
    (a.cos(), a.sin())
}

/// Filled unit disk as a triangle list (one triangle per segment).
pub fn unit_disk() -> Vec<MeshVertex> {
    let mut verts = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 3);
    for i in 0..CIRCLE_SEGMENTS {
        let (x0, y0) = circle_point(i);
        let (x1, y1) = circle_point(i + 1);
        verts.push(MeshVertex::new(0.0, 0.0, 1.0));
        verts.push(MeshVertex::new(x0, y0, 1.0));
        verts.push(MeshVertex::new(x1, y1, 1.0));
    }
    verts
}

/// Unit annulus; the inner edge sits at the instance's inner radius.
pub fn unit_ring() -> Vec<MeshVertex> {
    let mut verts = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 6);
    for i in 0..CIRCLE_SEGMENTS {
        let (x0, y0) = circle_point(i);
        let (x1, y1) = circle_point(i + 1);
        verts.push(MeshVertex::new(x0, y0, 0.0));
        verts.push(MeshVertex::new(x0, y0, 1.0));
        verts.push(MeshVertex::new(x1, y1, 1.0));
        verts.push(MeshVertex::new(x0, y0, 0.0));
        verts.push(MeshVertex::new(x1, y1, 1.0));
        verts.push(MeshVertex::new(x1, y1, 0.0));
    }
    verts
}

/// Unit square centred on the origin, two triangles.
pub fn unit_quad() -> Vec<MeshVertex> {
    vec![
        MeshVertex::new(-0.5, -0.5, 1.0),
        MeshVertex::new(0.5, -0.5, 1.0),
        MeshVertex::new(0.5, 0.5, 1.0),
        MeshVertex::new(-0.5, -0.5, 1.0),
        MeshVertex::new(0.5, 0.5, 1.0),
        MeshVertex::new(-0.5, 0.5, 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_corners() {
        let screen = Vec2::new(1920.0, 1080.0);
        assert_eq!(screen_to_ndc(Vec2::ZERO, screen), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(screen, screen), Vec2::new(1.0, -1.0));
        assert_eq!(screen_to_ndc(screen * 0.5, screen), Vec2::ZERO);
    }

    #[test]
    fn test_offset_flips_y() {
        let ndc = pixel_offset_to_ndc(Vec2::new(19.2, 10.8), Vec2::new(1920.0, 1080.0));
        assert!((ndc.x - 0.02).abs() < 1e-6);
        assert!((ndc.y + 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_disk_mesh() {
        let disk = unit_disk();
        assert_eq!(disk.len(), 96);
        for v in &disk {
            let r = Vec2::from(v.local).length();
            assert!(r < 1e-6 || (r - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ring_and_quad() {
        assert_eq!(unit_ring().len(), 192);
        assert_eq!(unit_ring().iter().filter(|v| v.edge == 0.0).count(), 96);
        let quad = unit_quad();
        assert_eq!(quad.len(), 6);
        assert!(quad.iter().all(|v| v.local[0].abs() == 0.5 && v.local[1].abs() == 0.5));
    }

    #[test]
    fn test_display_mirror() {
        assert_eq!(to_display(500.0, 400.0, 1920.0), Vec2::new(1420.0, 400.0));
    }
}
