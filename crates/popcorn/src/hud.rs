//! Text layer drawn with egui over the instanced scene: scores, clock,
//! banners, prompts, and popup labels.

use glam::Vec2;

use popcorn_core::Rgb;
use popcorn_effects::Effects;
use popcorn_game::{GameEvent, GameSimulation, GameState, Player};
use popcorn_render::geometry::to_display;
use popcorn_render::scene::{score_anchor, score_radius};

/// How long a phase banner stays up, seconds.
pub const BANNER_DURATION: f32 = 2.0;
const BANNER_FADE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub title: String,
    pub subtitle: String,
    pub remaining: f32,
}

impl Banner {
    pub fn alpha(&self) -> f32 {
        (self.remaining / BANNER_FADE).clamp(0.0, 1.0)
    }
}

/// HUD state that outlives a single frame.
#[derive(Debug, Default)]
pub struct HudState {
    banner: Option<Banner>,
}

impl HudState {
    pub fn on_event(&mut self, event: &GameEvent) {
        let (title, subtitle) = match event {
            GameEvent::Started => ("GO!", "Catch the popcorn"),
            GameEvent::PhaseChanged { phase } => {
                let cfg = phase.config();
                (cfg.title, cfg.subtitle)
            }
            GameEvent::GameOver { .. } | GameEvent::Paused => {
                self.banner = None;
                return;
            }
            _ => return,
        };
        self.banner = Some(Banner {
            title: title.to_uppercase(),
            subtitle: subtitle.to_string(),
            remaining: BANNER_DURATION,
        });
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(banner) = &mut self.banner {
            banner.remaining -= dt;
            if banner.remaining <= 0.0 {
                self.banner = None;
            }
        }
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }
}

pub struct HudView<'a> {
    pub sim: &'a GameSimulation,
    pub effects: &'a Effects,
    pub fps: f32,
    pub detection_ms: f64,
}

/// Centre prompt for states that wait on the players.
pub fn prompt(sim: &GameSimulation) -> Option<(String, String)> {
    match sim.state() {
        GameState::Calibrating => Some((
            "POPCORN BATTLE".to_string(),
            "Show an OK gesture to start (or press Space)".to_string(),
        )),
        GameState::Countdown => Some((
            format!("{}", sim.countdown_remaining().ceil().max(1.0) as u32),
            "Get ready".to_string(),
        )),
        GameState::Paused => Some(("PAUSED".to_string(), "Press P to resume".to_string())),
        GameState::GameOver => {
            let title = match sim.winner() {
                Some(p) => format!("{} WINS!", p.label()),
                None => "DRAW".to_string(),
            };
            let subtitle = format!(
                "{} : {}   Press Space to play again",
                sim.score(Player::P1),
                sim.score(Player::P2)
            );
            Some((title, subtitle))
        }
        GameState::Playing => None,
    }
}

fn color32(c: Rgb, alpha: f32) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
}

pub fn draw_hud(ctx: &egui::Context, state: &HudState, view: &HudView<'_>) {
    let (w, h) = view.sim.size();
    let rect = ctx.screen_rect();
    // Scene coordinates are a fixed layout stretched over the window.
    let to_screen = |p: Vec2| {
        egui::pos2(
            rect.min.x + p.x / w * rect.width(),
            rect.min.y + p.y / h * rect.height(),
        )
    };
    let scale = rect.height() / h;
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("hud"),
    ));
    let font = |size: f32| egui::FontId::proportional(size * scale);

    for player in Player::ALL {
        let anchor = score_anchor(player, w);
        let score = view.sim.score(player);
        painter.text(
            to_screen(anchor),
            egui::Align2::CENTER_CENTER,
            score.to_string(),
            font(28.0),
            egui::Color32::WHITE,
        );
        painter.text(
            to_screen(anchor + Vec2::new(0.0, score_radius(score) + 14.0)),
            egui::Align2::CENTER_TOP,
            player.label(),
            font(20.0),
            color32(player.color(), 1.0),
        );
        let combo = view.sim.combo(player);
        if combo.count >= 2 {
            painter.text(
                to_screen(anchor + Vec2::new(0.0, 96.0)),
                egui::Align2::CENTER_TOP,
                format!("{} combo  x{:.1}", combo.count, combo.multiplier()),
                font(18.0),
                egui::Color32::GOLD,
            );
        }
    }

    if matches!(view.sim.state(), GameState::Playing | GameState::Paused) {
        painter.text(
            to_screen(Vec2::new(w * 0.5, 72.0)),
            egui::Align2::CENTER_TOP,
            format!("{:.0}s  {}", view.sim.remaining_time().ceil(), view.sim.phase().config().title),
            font(20.0),
            egui::Color32::WHITE,
        );
    }

    for popup in view.effects.popups().iter_active() {
        let alpha = popup.alpha();
        painter.text(
            to_screen(to_display(popup.x, popup.y, w)),
            egui::Align2::CENTER_CENTER,
            popup.label(),
            font(26.0),
            color32(popup.color, alpha),
        );
    }

    let center = Vec2::new(w * 0.5, h * 0.42);
    if let Some((title, subtitle)) = prompt(view.sim) {
        painter.text(to_screen(center), egui::Align2::CENTER_BOTTOM, title, font(72.0), egui::Color32::WHITE);
        painter.text(
            to_screen(center + Vec2::new(0.0, 12.0)),
            egui::Align2::CENTER_TOP,
            subtitle,
            font(28.0),
            egui::Color32::LIGHT_GRAY,
        );
    } else if let Some(banner) = state.banner() {
        let a = banner.alpha();
        painter.text(to_screen(center), egui::Align2::CENTER_BOTTOM, &banner.title, font(72.0), color32(Rgb::new(255, 215, 0), a));
        painter.text(
            to_screen(center + Vec2::new(0.0, 12.0)),
            egui::Align2::CENTER_TOP,
            &banner.subtitle,
            font(28.0),
            color32(Rgb::WHITE, a),
        );
    }

    egui::Area::new(egui::Id::new("perf"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-40.0, -10.0))
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!("{:.0} FPS | {:.1} ms", view.fps, view.detection_ms))
                    .size(12.0)
                    .color(egui::Color32::LIGHT_GRAY),
            );
        });

    egui::Area::new(egui::Id::new("controls"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new("Space: Start | P: Pause | R: Reset | F11: Fullscreen | Esc: Quit")
                    .size(12.0)
                    .color(egui::Color32::GRAY),
            );
        });
}
