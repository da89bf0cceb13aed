//! Falling items.

use nalgebra::Point2;
use popcorn_core::Rgb;

use crate::catalog::ItemType;

/// Spawn height (above the top edge).
pub const SPAWN_Y: f32 = -50.0;
/// Items further than this below the bottom edge are pruned.
pub const PRUNE_MARGIN: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FallingItem {
    pub id: u64,
    pub item_type: ItemType,
    pub x: f32,
    pub y: f32,
    /// Diameter in pixels.
    pub size: f32,
    /// Fall speed in px/s.
    pub speed: f32,
    /// Degrees in [0, 360).
    pub rotation: f32,
    /// Degrees per second.
    pub rotation_speed: f32,
    pub active: bool,
    pub captured: bool,
    pub capture_alpha: f32,
    pub color: Rgb,
}

impl FallingItem {
    pub fn new(id: u64, item_type: ItemType, x: f32, y: f32, speed: f32, rotation_speed: f32) -> Self {
        let cfg = item_type.config();
        Self {
            id,
            item_type,
            x,
            y,
            size: cfg.size,
            speed,
            rotation: 0.0,
            rotation_speed,
            active: true,
            captured: false,
            capture_alpha: 1.0,
            color: cfg.color,
        }
    }

    pub fn score(&self) -> i32 {
        self.item_type.score()
    }

    pub fn is_bomb(&self) -> bool {
        self.item_type.is_bomb()
    }

    pub fn is_high_value(&self) -> bool {
        self.item_type.is_high_value()
    }

    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    /// Integrate fall and spin.
    pub fn step(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.y += self.speed * dt;
        self.rotation = wrap_degrees(self.rotation + self.rotation_speed * dt);
    }

    /// Mark as caught; the item leaves play.
    pub fn capture(&mut self) {
        self.active = false;
        self.captured = true;
    }

    /// Whether the item should be dropped from the simulation.
    pub fn is_expired(&self, screen_h: f32) -> bool {
        !self.active || self.y > screen_h + PRUNE_MARGIN
    }
}

/// Wrap an angle in degrees into [0, 360).
pub fn wrap_degrees(deg: f32) -> f32 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        let tiny = wrap_degrees(-1e-7);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_step_moves_and_spins() {
        let mut item = FallingItem::new(1, ItemType::Ticket, 100.0, SPAWN_Y, 400.0, -180.0);
        item.step(0.5);
        assert_eq!(item.y, 150.0);
        assert_eq!(item.rotation, 270.0);
    }

    #[test]
    fn test_inactive_does_not_move() {
        let mut item = FallingItem::new(1, ItemType::Popcorn, 0.0, 0.0, 400.0, 0.0);
        item.capture();
        item.step(1.0);
        assert_eq!(item.y, 0.0);
        assert!(item.captured);
    }

    #[test]
    fn test_prune_boundary() {
        let h = 1080.0;
        let mut item = FallingItem::new(1, ItemType::Popcorn, 0.0, h + PRUNE_MARGIN, 400.0, 0.0);
        assert!(!item.is_expired(h));
        item.y += 0.01;
        assert!(item.is_expired(h));
    }
}
