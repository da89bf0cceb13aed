//! Decaying random screen offset.

use glam::Vec2;
use rand::Rng;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenShake {
    intensity: f32,
    duration: f32,
    elapsed: f32,
    offset: Vec2,
}

impl ScreenShake {
    /// Start (or restart) a shake of `intensity` pixels for `duration` seconds.
    pub fn trigger(&mut self, intensity: f32, duration: f32) {
        self.intensity = intensity.max(0.0);
        self.duration = duration.max(0.0);
        self.elapsed = 0.0;
    }

    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        if !self.is_active() {
            self.offset = Vec2::ZERO;
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.offset = Vec2::ZERO;
            return;
        }
        let current = self.current_intensity();
        self.offset = Vec2::new(
            rng.gen_range(-1.0..=1.0) * current,
            rng.gen_range(-1.0..=1.0) * current,
        );
    }

    pub fn is_active(&self) -> bool {
        self.elapsed < self.duration
    }

    /// Intensity after linear decay.
    pub fn current_intensity(&self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        self.intensity * (1.0 - self.elapsed / self.duration)
    }

    /// Pixel offset for this frame's draws.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_offset_bounded_then_zero() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut shake = ScreenShake::default();
        shake.trigger(20.0, 0.3);
        let mut moved = false;
        for _ in 0..17 {
            shake.update(1.0 / 60.0, &mut rng);
            let bound = shake.current_intensity() + 1e-4;
            assert!(shake.offset().x.abs() <= bound && shake.offset().y.abs() <= bound);
            moved |= shake.offset() != Vec2::ZERO;
        }
        assert!(moved);
        for _ in 0..3 {
            shake.update(1.0 / 60.0, &mut rng);
        }
        assert!(!shake.is_active());
        assert_eq!(shake.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_idle_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut shake = ScreenShake::default();
        shake.update(0.1, &mut rng);
        assert_eq!(shake.offset(), Vec2::ZERO);
        assert_eq!(shake.current_intensity(), 0.0);
    }
}
