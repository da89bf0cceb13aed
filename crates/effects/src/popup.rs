//! Rising "+N" score labels.

use popcorn_core::Rgb;

pub const DEFAULT_POPUP_CAPACITY: usize = 32;
/// Upward drift in px/s.
pub const POPUP_RISE_SPEED: f32 = 60.0;
/// Seconds a popup stays on screen.
pub const POPUP_LIFETIME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorePopup {
    pub x: f32,
    pub y: f32,
    pub points: i32,
    pub color: Rgb,
    /// Seconds since spawn.
    pub age: f32,
    pub active: bool,
}

impl ScorePopup {
    /// Linear fade from 1 to 0 over the lifetime.
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age / POPUP_LIFETIME).clamp(0.0, 1.0)
    }

    pub fn label(&self) -> String {
        format!("{:+}", self.points)
    }
}

pub struct PopupPool {
    popups: Vec<ScorePopup>,
}

impl PopupPool {
    pub fn new(capacity: usize) -> Self {
        let idle = ScorePopup {
            x: 0.0,
            y: 0.0,
            points: 0,
            color: Rgb::WHITE,
            age: 0.0,
            active: false,
        };
        Self {
            popups: vec![idle; capacity],
        }
    }

    /// Show `points` at `(x, y)`. Dropped if every slot is busy.
    pub fn spawn(&mut self, x: f32, y: f32, points: i32, color: Rgb) -> bool {
        match self.popups.iter_mut().find(|p| !p.active) {
            Some(slot) => {
                *slot = ScorePopup {
                    x,
                    y,
                    points,
                    color,
                    age: 0.0,
                    active: true,
                };
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        for p in self.popups.iter_mut().filter(|p| p.active) {
            p.age += dt;
            p.y -= POPUP_RISE_SPEED * dt;
            if p.age > POPUP_LIFETIME {
                p.active = false;
            }
        }
    }

    pub fn clear(&mut self) {
        for p in self.popups.iter_mut() {
            p.active = false;
        }
    }

    pub fn active_count(&self) -> usize {
        self.popups.iter().filter(|p| p.active).count()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &ScorePopup> {
        self.popups.iter().filter(|p| p.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_and_fade() {
        let mut pool = PopupPool::new(4);
        assert!(pool.spawn(500.0, 400.0, 10, Rgb::WHITE));
        pool.update(0.5);
        let p = pool.iter_active().next().copied().unwrap();
        assert!((p.y - 370.0).abs() < 1e-4);
        assert!((p.alpha() - 0.5).abs() < 1e-6);
        assert_eq!(p.label(), "+10");
        pool.update(0.5);
        pool.update(0.01);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_retires_only_after_lifetime() {
        let mut pool = PopupPool::new(1);
        assert!(pool.spawn(0.0, 0.0, 5, Rgb::WHITE));
        pool.update(0.25);
        pool.update(0.75);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.iter_active().next().map(|p| p.alpha()), Some(0.0));
        pool.update(0.01);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_pool_full_drops() {
        let mut pool = PopupPool::new(2);
        assert!(pool.spawn(0.0, 0.0, 1, Rgb::WHITE));
        assert!(pool.spawn(0.0, 0.0, 2, Rgb::WHITE));
        assert!(!pool.spawn(0.0, 0.0, 3, Rgb::WHITE));
        pool.clear();
        assert!(pool.spawn(0.0, 0.0, -30, Rgb::WHITE));
        assert_eq!(pool.iter_active().next().map(|p| p.label()), Some("-30".to_string()));
    }
}
