//! Named particle bursts.

use rand::Rng;

use popcorn_core::Rgb;

use crate::particles::{Emitter, ParticlePool, Span};

/// Cap on combo-effect particles.
pub const MAX_COMBO_PARTICLES: usize = 50;
/// Extra upward speed added to combo particles, px/s.
const COMBO_LIFT: f32 = -100.0;

pub const CAPTURE_NORMAL: Emitter = Emitter {
    count: 20,
    speed: Span::new(80.0, 200.0),
    size: Span::new(3.0, 8.0),
    life: Span::new(0.2, 0.6),
    color: Rgb::new(255, 255, 150),
    gravity: 150.0,
};

pub const CAPTURE_PERFECT: Emitter = Emitter {
    count: 30,
    speed: Span::new(100.0, 300.0),
    size: Span::new(4.0, 12.0),
    life: Span::new(0.3, 0.8),
    color: Rgb::new(255, 215, 0),
    gravity: 100.0,
};

pub const CAPTURE_PERFECT_SPARKLE: Emitter = Emitter {
    count: 15,
    speed: Span::new(50.0, 150.0),
    size: Span::new(2.0, 6.0),
    life: Span::new(0.2, 0.5),
    color: Rgb::WHITE,
    gravity: 50.0,
};

pub const BOMB_FIRE: Emitter = Emitter {
    count: 40,
    speed: Span::new(150.0, 400.0),
    size: Span::new(5.0, 15.0),
    life: Span::new(0.3, 1.0),
    color: Rgb::new(255, 100, 50),
    gravity: 200.0,
};

pub const BOMB_SMOKE: Emitter = Emitter {
    count: 30,
    speed: Span::new(100.0, 250.0),
    size: Span::new(8.0, 20.0),
    life: Span::new(0.5, 1.2),
    color: Rgb::new(80, 80, 80),
    gravity: 50.0,
};

pub const BOMB_SPARKS: Emitter = Emitter {
    count: 15,
    speed: Span::new(50.0, 150.0),
    size: Span::new(2.0, 5.0),
    life: Span::new(0.2, 0.4),
    color: Rgb::new(255, 255, 100),
    gravity: 300.0,
};

pub fn capture_explosion<R: Rng>(pool: &mut ParticlePool, x: f32, y: f32, perfect: bool, rng: &mut R) -> usize {
    if perfect {
        pool.emit(x, y, &CAPTURE_PERFECT, rng) + pool.emit(x, y, &CAPTURE_PERFECT_SPARKLE, rng)
    } else {
        pool.emit(x, y, &CAPTURE_NORMAL, rng)
    }
}

/// Fire, smoke, and sparks.
pub fn bomb_explosion<R: Rng>(pool: &mut ParticlePool, x: f32, y: f32, rng: &mut R) -> usize {
    pool.emit(x, y, &BOMB_FIRE, rng) + pool.emit(x, y, &BOMB_SMOKE, rng) + pool.emit(x, y, &BOMB_SPARKS, rng)
}

pub fn combo_particle_count(combo: u32) -> usize {
    (10 + 3 * combo as usize).min(MAX_COMBO_PARTICLES)
}

/// Rainbow burst that grows with the combo.
pub fn combo_effect<R: Rng>(pool: &mut ParticlePool, x: f32, y: f32, combo: u32, rng: &mut R) -> usize {
    let count = combo_particle_count(combo);
    let top_speed = 50.0 + 10.0 * combo as f32;
    let emitter = Emitter {
        count,
        speed: Span::new(top_speed * 0.5, top_speed),
        size: Span::new(4.0, 8.0),
        life: Span::new(0.5, 1.0),
        color: Rgb::WHITE,
        gravity: 100.0,
    };
    pool.emit_with(x, y, &emitter, rng, |i, p| {
        p.color = Rgb::from_hsv(i as f32 / count as f32, 1.0, 1.0);
        p.vy += COMBO_LIFT;
    })
}

pub fn score_popup_count(score: i32) -> usize {
    (score.unsigned_abs() / 10 + 3) as usize
}

/// Small upward-floating sparkle in the scorer's colour.
pub fn score_popup<R: Rng>(pool: &mut ParticlePool, x: f32, y: f32, score: i32, color: Rgb, rng: &mut R) -> usize {
    let emitter = Emitter {
        count: score_popup_count(score),
        speed: Span::new(30.0, 80.0),
        size: Span::new(2.0, 5.0),
        life: Span::new(0.2, 0.5),
        color,
        gravity: -50.0,
    };
    pool.emit(x, y, &emitter, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bomb_layers() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = ParticlePool::new(500);
        assert_eq!(bomb_explosion(&mut pool, 300.0, 300.0, &mut rng), 85);
        let smoke = pool.iter_active().filter(|p| p.color == Rgb::new(80, 80, 80)).count();
        assert_eq!(smoke, 30);
    }

    #[test]
    fn test_capture_counts() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut pool = ParticlePool::new(500);
        assert_eq!(capture_explosion(&mut pool, 0.0, 0.0, false, &mut rng), 20);
        assert_eq!(capture_explosion(&mut pool, 0.0, 0.0, true, &mut rng), 45);
    }

    #[test]
    fn test_combo_count_capped() {
        assert_eq!(combo_particle_count(2), 16);
        assert_eq!(combo_particle_count(10), 40);
        assert_eq!(combo_particle_count(20), 50);
    }

    #[test]
    fn test_combo_rainbow() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = ParticlePool::new(500);
        assert_eq!(combo_effect(&mut pool, 0.0, 0.0, 5, &mut rng), 25);
        let first = pool.iter_active().next().map(|p| p.color);
        assert_eq!(first, Some(Rgb::new(255, 0, 0)));
        let distinct: std::collections::HashSet<_> = pool.iter_active().map(|p| p.color).collect();
        assert!(distinct.len() > 10);
    }

    #[test]
    fn test_score_popup_count() {
        assert_eq!(score_popup_count(10), 4);
        assert_eq!(score_popup_count(-30), 6);
        assert_eq!(score_popup_count(150), 18);
        let mut rng = StdRng::seed_from_u64(4);
        let mut pool = ParticlePool::new(500);
        score_popup(&mut pool, 0.0, 0.0, 25, Rgb::new(0, 122, 255), &mut rng);
        assert!(pool.iter_active().all(|p| p.gravity < 0.0));
    }
}
