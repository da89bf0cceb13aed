//! Phase-driven item spawner.

use rand::Rng;

use crate::catalog::{item_for_roll, GamePhase, TOTAL_SPAWN_WEIGHT};
use crate::item::{FallingItem, SPAWN_Y};

/// Horizontal spawn band as a fraction of screen width.
pub const SPAWN_X_MIN: f32 = 0.1;
pub const SPAWN_X_MAX: f32 = 0.9;
/// Per-item speed jitter around the phase speed.
pub const SPEED_JITTER_MIN: f32 = 0.8;
pub const SPEED_JITTER_MAX: f32 = 1.2;
/// Spin range in degrees per second.
pub const MAX_ROTATION_SPEED: f32 = 180.0;

/// Accumulates time and emits items at the phase's spawn rate.
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    timer: f32,
    next_id: u64,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the interval timer. Ids keep counting.
    pub fn reset_timer(&mut self) {
        self.timer = 0.0;
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Hand out the next item id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Advance by `dt` and push every item that became due. Returns how many
    /// were spawned.
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        phase: GamePhase,
        screen_w: f32,
        rng: &mut R,
        items: &mut Vec<FallingItem>,
    ) -> usize {
        let interval = phase.spawn_interval();
        self.timer += dt;
        let mut spawned = 0;
        while self.timer >= interval {
            self.timer -= interval;
            items.push(self.spawn_one(phase, screen_w, rng));
            spawned += 1;
        }
        spawned
    }

    /// Build one item at the top of the screen.
    pub fn spawn_one<R: Rng>(&mut self, phase: GamePhase, screen_w: f32, rng: &mut R) -> FallingItem {
        let id = self.allocate_id();
        let x = rng.gen_range(SPAWN_X_MIN..=SPAWN_X_MAX) * screen_w;
        let rotation_speed = rng.gen_range(-MAX_ROTATION_SPEED..=MAX_ROTATION_SPEED);
        let item_type = item_for_roll(rng.gen_range(0..TOTAL_SPAWN_WEIGHT));
        let speed = phase.config().fall_speed
            * item_type.config().speed_multiplier
            * rng.gen_range(SPEED_JITTER_MIN..=SPEED_JITTER_MAX);

        FallingItem::new(id, item_type, x, SPAWN_Y, speed, rotation_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemType, ITEM_SPAWN_WEIGHTS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn test_spawn_rate_warmup() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut spawner = Spawner::new();
        let mut items = Vec::new();
        // 1 s in 60 ticks at 4/s.
        for _ in 0..60 {
            spawner.update(1.0 / 60.0, GamePhase::Warmup, 1920.0, &mut rng, &mut items);
        }
        assert!((3..=4).contains(&items.len()), "spawned {}", items.len());
    }

    #[test]
    fn test_large_dt_spawns_multiple() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut spawner = Spawner::new();
        let mut items = Vec::new();
        let n = spawner.update(1.01, GamePhase::Finale, 1920.0, &mut rng, &mut items);
        assert_eq!(n, 8);
        assert!(spawner.timer() < GamePhase::Finale.spawn_interval());
    }

    #[test]
    fn test_spawn_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut spawner = Spawner::new();
        for _ in 0..500 {
            let item = spawner.spawn_one(GamePhase::Rush, 1000.0, &mut rng);
            assert!(item.x >= 100.0 && item.x <= 900.0);
            assert_eq!(item.y, SPAWN_Y);
            assert!(item.rotation_speed.abs() <= MAX_ROTATION_SPEED);
            let base = 620.0 * item.item_type.config().speed_multiplier;
            assert!(item.speed >= base * 0.8 - 1e-3 && item.speed <= base * 1.2 + 1e-3);
            assert!(item.speed > 0.0);
        }
    }

    #[test]
    fn test_ids_unique_and_monotonic() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut spawner = Spawner::new();
        let a = spawner.spawn_one(GamePhase::Warmup, 1920.0, &mut rng);
        spawner.reset_timer();
        let b = spawner.spawn_one(GamePhase::Warmup, 1920.0, &mut rng);
        assert!(b.id > a.id);
    }

    #[test]
    fn test_type_frequencies_converge_to_weights() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut spawner = Spawner::new();
        let n = 20_000;
        let mut counts: HashMap<ItemType, u32> = HashMap::new();
        for _ in 0..n {
            let item = spawner.spawn_one(GamePhase::Warmup, 1920.0, &mut rng);
            *counts.entry(item.item_type).or_default() += 1;
        }
        for (ty, weight) in ITEM_SPAWN_WEIGHTS {
            let freq = counts.get(&ty).copied().unwrap_or(0) as f64 / n as f64;
            let expected = weight as f64 / 100.0;
            assert!(
                (freq - expected).abs() < 0.015,
                "{:?}: freq {freq:.3} vs weight {expected:.2}",
                ty
            );
        }
    }
}
