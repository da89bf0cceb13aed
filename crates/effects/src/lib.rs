//! Visual feedback for game events: particle bursts, floating score labels,
//! screen shake, and flash.
//!
//! [`Effects`] owns every pool. The orchestrator forwards each
//! [`GameEvent`] to [`Effects::handle_event`] and ticks it once per frame.

pub mod flash;
pub mod particles;
pub mod popup;
pub mod presets;
pub mod shake;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use popcorn_core::color::palette;
use popcorn_core::config::EffectsConfig;
use popcorn_game::{GameEvent, Player};

pub use flash::Flash;
pub use particles::{Particle, ParticlePool};
pub use popup::{PopupPool, ScorePopup};
pub use shake::ScreenShake;

/// Bomb shake strength in pixels.
pub const BOMB_SHAKE_INTENSITY: f32 = 20.0;
pub const BOMB_SHAKE_DURATION: f32 = 0.3;
pub const BOMB_FLASH: f32 = 0.6;
pub const PERFECT_FLASH: f32 = 0.25;

pub struct Effects {
    particles: ParticlePool,
    popups: PopupPool,
    shake: ScreenShake,
    flash: Flash,
    last_capture: [Vec2; 2],
    rng: StdRng,
}

impl Effects {
    pub fn new(config: &EffectsConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        log::info!(
            "Effects initialized ({} particles, {} popups)",
            config.particle_capacity,
            config.popup_capacity
        );
        Self {
            particles: ParticlePool::new(config.particle_capacity),
            popups: PopupPool::new(config.popup_capacity),
            shake: ScreenShake::default(),
            flash: Flash::default(),
            last_capture: [Vec2::ZERO; 2],
            rng,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.particles.update(dt);
        self.popups.update(dt);
        self.shake.update(dt, &mut self.rng);
        self.flash.update(dt);
    }

    /// Turn one simulation event into effects.
    pub fn handle_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Captured(c) => {
                let (x, y) = (c.position.x, c.position.y);
                self.last_capture[c.player.index()] = Vec2::new(x, y);
                let color = c.player.color();
                presets::capture_explosion(&mut self.particles, x, y, c.perfect, &mut self.rng);
                presets::score_popup(&mut self.particles, x, y, c.points, color, &mut self.rng);
                self.popups.spawn(x, y, c.points, color);
                if c.perfect {
                    self.flash.trigger(PERFECT_FLASH);
                }
            }
            GameEvent::BombHit(c) => {
                let (x, y) = (c.position.x, c.position.y);
                presets::bomb_explosion(&mut self.particles, x, y, &mut self.rng);
                self.popups.spawn(x, y, c.points, palette::WARNING);
                self.shake.trigger(BOMB_SHAKE_INTENSITY, BOMB_SHAKE_DURATION);
                self.flash.trigger(BOMB_FLASH);
            }
            GameEvent::ComboMilestone { player, combo } => {
                let at = self.last_capture[player.index()];
                presets::combo_effect(&mut self.particles, at.x, at.y, *combo, &mut self.rng);
            }
            GameEvent::MultiCapture { player, bonus, .. } => {
                let at = self.last_capture[player.index()];
                self.popups.spawn(at.x, at.y - 40.0, *bonus, palette::GOLD);
            }
            GameEvent::Started => self.clear(),
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.popups.clear();
        self.shake.clear();
        self.flash.clear();
    }

    pub fn particles(&self) -> &ParticlePool {
        &self.particles
    }

    pub fn popups(&self) -> &PopupPool {
        &self.popups
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake.offset()
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_active()
    }

    pub fn flash(&self) -> f32 {
        self.flash.value()
    }

    /// Where `player` last scored, in screen space.
    pub fn last_capture(&self, player: Player) -> Vec2 {
        self.last_capture[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use popcorn_game::catalog::ItemType;
    use popcorn_game::Capture;

    fn capture(item_type: ItemType, points: i32, perfect: bool) -> Capture {
        Capture {
            item_id: 1,
            item_type,
            player: Player::P1,
            person_id: 0,
            is_left_hand: true,
            position: Point2::new(300.0, 300.0),
            hand: Point2::new(300.0, 300.0),
            base_score: item_type.score(),
            points,
            multiplier: 1.0,
            perfect,
            extreme: false,
            color: item_type.config().color,
        }
    }

    fn effects() -> Effects {
        Effects::new(&EffectsConfig::default(), Some(11))
    }

    #[test]
    fn test_bomb_hit_effects() {
        let mut fx = effects();
        fx.handle_event(&GameEvent::BombHit(capture(ItemType::Bomb, -30, false)));
        assert_eq!(fx.particles().active_count(), 85);
        assert!(fx.is_shaking());
        assert_eq!(fx.flash(), BOMB_FLASH);
        let popup = fx.popups().iter_active().next().copied().unwrap();
        assert_eq!(popup.points, -30);
        assert_eq!(popup.color, palette::WARNING);
        fx.update(1.0 / 60.0);
        assert!(fx.shake_offset().length() <= BOMB_SHAKE_INTENSITY * 1.5);
    }

    #[test]
    fn test_perfect_capture_effects() {
        let mut fx = effects();
        fx.handle_event(&GameEvent::Captured(capture(ItemType::Popcorn, 15, true)));
        // 45 burst + 4 score sparkles.
        assert_eq!(fx.particles().active_count(), 49);
        assert_eq!(fx.flash(), PERFECT_FLASH);
        assert_eq!(fx.popups().active_count(), 1);
        assert_eq!(fx.last_capture(Player::P1), Vec2::new(300.0, 300.0));
        assert!(!fx.is_shaking());
    }

    #[test]
    fn test_milestone_bursts_at_last_capture() {
        let mut fx = effects();
        fx.handle_event(&GameEvent::Captured(capture(ItemType::Ticket, 25, false)));
        let before = fx.particles().active_count();
        fx.handle_event(&GameEvent::ComboMilestone {
            player: Player::P1,
            combo: 2,
        });
        assert_eq!(fx.particles().active_count(), before + 16);
    }

    #[test]
    fn test_everything_expires() {
        let mut fx = effects();
        fx.handle_event(&GameEvent::BombHit(capture(ItemType::Bomb, -30, false)));
        for _ in 0..120 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.particles().active_count(), 0);
        assert_eq!(fx.popups().active_count(), 0);
        assert_eq!(fx.flash(), 0.0);
        assert_eq!(fx.shake_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_start_clears() {
        let mut fx = effects();
        fx.handle_event(&GameEvent::Captured(capture(ItemType::Cola, 50, false)));
        fx.handle_event(&GameEvent::Started);
        assert_eq!(fx.particles().active_count(), 0);
        assert_eq!(fx.popups().active_count(), 0);
    }
}
