//! CPU-side draw list: layers of instanced primitives built from the game
//! and effects state each frame.
//!
//! Everything the simulation knows lives in un-mirrored camera space; the
//! builder mirrors x at this point so the overlay lines up with the mirrored
//! video. The screen-shake offset moves every game layer but not the HUD.

use std::ops::Range;

use glam::Vec2;

use popcorn_core::color::palette;
use popcorn_core::{Rgb, ZONE_P1, ZONE_SHARED};
use popcorn_effects::Effects;
use popcorn_game::catalog::GamePhase;
use popcorn_game::scoring::assign_player;
use popcorn_game::{FallingItem, GameSimulation, Player};

use crate::geometry::to_display;
use crate::pipelines::primitive::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Disk,
    Ring,
    Rect,
}

/// Consecutive instances sharing one mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub shape: Shape,
    pub range: Range<u32>,
}

/// Rings are drawn as this many concentric bands of fading alpha.
pub const RING_BANDS: usize = 3;
const RING_BAND_WIDTH: f32 = 3.0;

#[derive(Debug, Default)]
pub struct Scene {
    instances: Vec<Instance>,
    batches: Vec<Batch>,
    offset: Vec2,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.batches.clear();
        self.offset = Vec2::ZERO;
    }

    /// Offset applied to everything pushed from now on.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    fn push(&mut self, shape: Shape, instance: Instance) {
        let index = self.instances.len() as u32;
        self.instances.push(instance);
        match self.batches.last_mut() {
            Some(batch) if batch.shape == shape => batch.range.end = index + 1,
            _ => self.batches.push(Batch {
                shape,
                range: index..index + 1,
            }),
        }
    }

    pub fn disk(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        let c = center + self.offset;
        self.push(
            Shape::Disk,
            Instance {
                center: c.to_array(),
                scale: [radius, radius],
                color,
                inner: 0.0,
            },
        );
    }

    /// Annulus `thickness` pixels wide, outer edge at `radius`.
    pub fn annulus(&mut self, center: Vec2, radius: f32, thickness: f32, color: [f32; 4]) {
        if radius <= 0.0 {
            return;
        }
        let c = center + self.offset;
        self.push(
            Shape::Ring,
            Instance {
                center: c.to_array(),
                scale: [radius, radius],
                color,
                inner: ((radius - thickness) / radius).clamp(0.0, 1.0),
            },
        );
    }

    /// Soft outline: concentric bands stepping inward with decreasing alpha.
    pub fn ring(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        for band in 0..RING_BANDS {
            let fade = 1.0 - band as f32 / RING_BANDS as f32;
            let r = radius - band as f32 * RING_BAND_WIDTH;
            self.annulus(center, r, RING_BAND_WIDTH, [color[0], color[1], color[2], color[3] * fade]);
        }
    }

    /// Axis-aligned rectangle from its top-left corner.
    pub fn rect(&mut self, min: Vec2, size: Vec2, color: [f32; 4]) {
        let c = min + size * 0.5 + self.offset;
        self.push(
            Shape::Rect,
            Instance {
                center: c.to_array(),
                scale: size.to_array(),
                color,
                inner: 0.0,
            },
        );
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }
}

fn rgba(color: Rgb, alpha: f32) -> [f32; 4] {
    color.to_rgba_f32(alpha)
}

const GRAY: Rgb = Rgb::new(90, 90, 90);

/// Lays out one frame in the fixed layer order.
pub struct SceneBuilder {
    scene: Scene,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self { scene: Scene::new() }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Rebuild the scene. The camera background is drawn separately, below
    /// everything here.
    pub fn build(&mut self, sim: &GameSimulation, effects: &Effects, fps: f32) -> &Scene {
        let (w, h) = sim.size();
        self.scene.clear();
        self.scene.set_offset(effects.shake_offset());
        self.zones(w, h);
        self.items(sim.items(), w);
        self.capture_zones(sim, w);
        self.popups(effects, w);
        self.particles(effects, w);
        self.scene.set_offset(Vec2::ZERO);
        self.hud(sim, w, h, fps);
        &self.scene
    }

    fn zones(&mut self, w: f32, h: f32) {
        let p1_w = w * ZONE_P1;
        let shared_w = w * ZONE_SHARED;
        let s = &mut self.scene;
        s.rect(Vec2::ZERO, Vec2::new(p1_w, h), rgba(palette::P1, 0.08));
        s.rect(Vec2::new(p1_w, 0.0), Vec2::new(shared_w, h), rgba(palette::SHARED, 0.05));
        s.rect(Vec2::new(p1_w + shared_w, 0.0), Vec2::new(w - p1_w - shared_w, h), rgba(palette::P2, 0.08));
        for x in [p1_w, p1_w + shared_w] {
            s.rect(Vec2::new(x - 2.0, 0.0), Vec2::new(4.0, h), rgba(Rgb::WHITE, 0.3));
        }
    }

    fn items(&mut self, items: &[FallingItem], w: f32) {
        let s = &mut self.scene;
        for item in items.iter().filter(|i| i.active) {
            let p = to_display(item.x, item.y, w);
            let r = item.radius();
            if item.is_high_value() {
                s.disk(p, r * 1.35, rgba(palette::GOLD, 0.35));
            }
            s.disk(p, r, rgba(item.color, 1.0));
            if item.is_bomb() {
                s.annulus(p, r * 1.15, 4.0, rgba(palette::WARNING, 0.9));
            } else {
                // Spin marker, mirrored with the item.
                let a = item.rotation.to_radians();
                let marker = p + Vec2::new(-a.cos(), a.sin()) * r * 0.6;
                s.disk(marker, r * 0.12, rgba(Rgb::WHITE, 0.35));
            }
            s.disk(p - Vec2::splat(r * 0.3), r * 0.25, rgba(Rgb::WHITE, 0.6));
        }
    }

    fn capture_zones(&mut self, sim: &GameSimulation, w: f32) {
        let s = &mut self.scene;
        for person in sim.persons() {
            for wrist in [person.left_wrist(), person.right_wrist()] {
                if !wrist.valid {
                    continue;
                }
                let player = assign_player(sim.player_assignment(), wrist.x, Some(person), w);
                let p = to_display(wrist.x, wrist.y, w);
                s.ring(p, sim.hand_radius(), rgba(player.color(), 0.8));
                s.annulus(p, sim.perfect_radius(), 2.0, rgba(palette::GOLD, 0.7));
                s.disk(p, 4.0, rgba(Rgb::WHITE, 1.0));
            }
        }
    }

    fn popups(&mut self, effects: &Effects, w: f32) {
        for popup in effects.popups().iter_active() {
            let p = to_display(popup.x, popup.y, w);
            self.scene.disk(p, 22.0, rgba(popup.color, 0.35 * popup.alpha()));
        }
    }

    fn particles(&mut self, effects: &Effects, w: f32) {
        for particle in effects.particles().iter_active() {
            let p = to_display(particle.x, particle.y, w);
            let alpha = particle.alpha as f32 / 255.0;
            self.scene.disk(p, particle.size * 0.5, rgba(particle.color, alpha));
        }
    }

    fn hud(&mut self, sim: &GameSimulation, w: f32, h: f32, fps: f32) {
        let s = &mut self.scene;

        for player in Player::ALL {
            let center = score_anchor(player, w);
            let score = sim.score(player);
            s.disk(center, score_radius(score), rgba(player.color(), 0.85));
            s.annulus(center, score_radius(score), 3.0, rgba(Rgb::WHITE, 0.9));

            let dots = sim.combo(player).count.min(MAX_COMBO_DOTS) as usize;
            let start = center.x - (dots.saturating_sub(1)) as f32 * COMBO_DOT_SPACING * 0.5;
            for i in 0..dots {
                let p = Vec2::new(start + i as f32 * COMBO_DOT_SPACING, center.y + 80.0);
                s.disk(p, 5.0, rgba(palette::GOLD, 1.0));
            }
        }

        let bar_w = w * TIME_BAR_WIDTH;
        let bar_min = Vec2::new((w - bar_w) * 0.5, 24.0);
        s.rect(bar_min, Vec2::new(bar_w, TIME_BAR_HEIGHT), rgba(GRAY, 0.6));
        let frac = time_fraction(sim.remaining_time(), sim.duration());
        let fill = if sim.remaining_time() > 10.0 {
            palette::FPS_GREEN
        } else {
            palette::WARNING
        };
        s.rect(bar_min, Vec2::new(bar_w * frac, TIME_BAR_HEIGHT), rgba(fill, 0.9));

        let current = sim.phase().index();
        for phase in GamePhase::ALL {
            let i = phase.index();
            let p = Vec2::new(w * 0.5 + (i as f32 - 1.0) * 24.0, 56.0);
            let color = if i <= current { palette::GOLD } else { GRAY };
            s.disk(p, 6.0, rgba(color, 1.0));
        }

        let fps_r = 4.0 + (fps / 60.0).clamp(0.0, 1.0) * 4.0;
        s.disk(Vec2::new(w - 24.0, h - 24.0), fps_r, rgba(palette::FPS_GREEN, 1.0));
    }
}

pub const MAX_COMBO_DOTS: u32 = 10;
const COMBO_DOT_SPACING: f32 = 14.0;
const TIME_BAR_WIDTH: f32 = 0.3;
const TIME_BAR_HEIGHT: f32 = 14.0;
const SCORE_RADIUS_MIN: f32 = 24.0;
const SCORE_RADIUS_GROWTH: f32 = 36.0;
const SCORE_RADIUS_FULL_AT: f32 = 500.0;

/// Where a player's score disk sits; P1 is on the user's left.
pub fn score_anchor(player: Player, screen_w: f32) -> Vec2 {
    match player {
        Player::P1 => Vec2::new(90.0, 90.0),
        Player::P2 => Vec2::new(screen_w - 90.0, 90.0),
    }
}

/// Score disk radius grows with the (non-negative part of the) score.
pub fn score_radius(score: i32) -> f32 {
    let t = (score.max(0) as f32 / SCORE_RADIUS_FULL_AT).min(1.0);
    SCORE_RADIUS_MIN + SCORE_RADIUS_GROWTH * t
}

pub fn time_fraction(remaining: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    (remaining / duration).clamp(0.0, 1.0)
}
