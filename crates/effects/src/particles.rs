//! Fixed-capacity particle pool.

use rand::Rng;

use popcorn_core::Rgb;

/// Default pool size.
pub const DEFAULT_PARTICLE_CAPACITY: usize = 500;
/// Fractional size loss per second.
const SHRINK_RATE: f32 = 0.5;
const MIN_SIZE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining life as a fraction, 1 at birth and 0 at death.
    pub life: f32,
    /// Lifetime in seconds.
    pub max_life: f32,
    pub size: f32,
    pub color: Rgb,
    pub alpha: u8,
    pub gravity: f32,
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            life: 0.0,
            max_life: 1.0,
            size: MIN_SIZE,
            color: Rgb::WHITE,
            alpha: 0,
            gravity: 0.0,
            active: false,
        }
    }
}

impl Particle {
    /// Advance one tick. Deactivates when life runs out.
    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.life -= dt / self.max_life.max(f32::EPSILON);
        if self.life <= 0.0 {
            self.life = 0.0;
            self.active = false;
            return;
        }
        self.vy += self.gravity * dt;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.alpha = (255.0 * self.life).clamp(0.0, 255.0) as u8;
        self.size = (self.size * (1.0 - SHRINK_RATE * dt)).max(MIN_SIZE);
    }
}

/// Closed range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }
}

/// One burst of particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    pub count: usize,
    pub speed: Span,
    pub size: Span,
    /// Lifetime in seconds.
    pub life: Span,
    pub color: Rgb,
    pub gravity: f32,
}

pub struct ParticlePool {
    particles: Vec<Particle>,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// First inactive slot, if any.
    pub fn acquire(&mut self) -> Option<&mut Particle> {
        self.particles.iter_mut().find(|p| !p.active)
    }

    /// Emit a radial burst at `(x, y)`. Excess particles beyond the free
    /// slots are dropped. Returns how many were emitted.
    pub fn emit<R: Rng>(&mut self, x: f32, y: f32, emitter: &Emitter, rng: &mut R) -> usize {
        self.emit_with(x, y, emitter, rng, |_, _| {})
    }

    /// Like [`emit`](Self::emit), letting `tweak(index, particle)` adjust
    /// each particle after it is seeded.
    pub fn emit_with<R, F>(&mut self, x: f32, y: f32, emitter: &Emitter, rng: &mut R, mut tweak: F) -> usize
    where
        R: Rng,
        F: FnMut(usize, &mut Particle),
    {
        let mut emitted = 0;
        for i in 0..emitter.count {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = emitter.speed.sample(rng);
            let size = emitter.size.sample(rng);
            let max_life = emitter.life.sample(rng);
            let Some(p) = self.acquire() else {
                break;
            };
            *p = Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 1.0,
                max_life,
                size,
                color: emitter.color,
                alpha: 255,
                gravity: emitter.gravity,
                active: true,
            };
            tweak(i, p);
            emitted += 1;
        }
        emitted
    }

    pub fn update(&mut self, dt: f32) {
        for p in self.particles.iter_mut() {
            p.update(dt);
        }
    }

    pub fn clear(&mut self) {
        for p in self.particles.iter_mut() {
            p.active = false;
        }
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn burst(count: usize) -> Emitter {
        Emitter {
            count,
            speed: Span::new(80.0, 200.0),
            size: Span::new(3.0, 8.0),
            life: Span::new(0.2, 0.6),
            color: Rgb::WHITE,
            gravity: 150.0,
        }
    }

    #[test]
    fn test_capacity_bounds_emission() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = ParticlePool::new(500);
        let mut total = 0;
        for _ in 0..10 {
            total += pool.emit(100.0, 100.0, &burst(60), &mut rng);
        }
        assert_eq!(total, 500);
        assert_eq!(pool.active_count(), 500);
        assert_eq!(pool.emit(0.0, 0.0, &burst(5), &mut rng), 0);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut pool = ParticlePool::new(10);
        pool.emit(0.0, 0.0, &burst(10), &mut rng);
        // Longest life is 0.6 s.
        for _ in 0..40 {
            pool.update(1.0 / 60.0);
        }
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.emit(0.0, 0.0, &burst(10), &mut rng), 10);
        assert_eq!(pool.capacity(), 10);
    }

    #[test]
    fn test_update_rules() {
        let mut p = Particle {
            x: 0.0,
            y: 0.0,
            vx: 10.0,
            vy: 0.0,
            life: 1.0,
            max_life: 1.0,
            size: 10.0,
            color: Rgb::WHITE,
            alpha: 255,
            gravity: 100.0,
            active: true,
        };
        p.update(0.5);
        assert!((p.life - 0.5).abs() < 1e-6);
        assert!((p.vy - 50.0).abs() < 1e-4);
        assert!((p.x - 5.0).abs() < 1e-4);
        assert!((p.y - 25.0).abs() < 1e-4);
        assert_eq!(p.alpha, 127);
        assert!((p.size - 7.5).abs() < 1e-4);
        p.update(0.6);
        assert!(!p.active);
    }

    #[test]
    fn test_size_floor() {
        let mut p = Particle {
            life: 1.0,
            max_life: 100.0,
            size: 1.2,
            active: true,
            ..Particle::default()
        };
        for _ in 0..200 {
            p.update(0.1);
        }
        assert_eq!(p.size, 1.0);
    }

    #[test]
    fn test_emitted_ranges() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = ParticlePool::new(100);
        let e = burst(100);
        pool.emit(50.0, 60.0, &e, &mut rng);
        for p in pool.iter_active() {
            let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
            assert!(speed >= 80.0 - 1e-3 && speed <= 200.0 + 1e-3);
            assert!(e.size.contains(p.size));
            assert!(e.life.contains(p.max_life));
            assert_eq!((p.x, p.y), (50.0, 60.0));
        }
    }

    #[test]
    fn test_clear() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut pool = ParticlePool::new(20);
        pool.emit(0.0, 0.0, &burst(20), &mut rng);
        pool.clear();
        assert_eq!(pool.active_count(), 0);
    }
}
