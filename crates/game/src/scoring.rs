//! Players, combos, and score rules.

use popcorn_core::config::PlayerAssignment;
use popcorn_core::color::palette;
use popcorn_core::{mirror_x, zone_at_display_x, Person, Rgb, Zone};

/// Default seconds a combo survives without a positive capture.
pub const COMBO_TIMEOUT: f32 = 2.0;
/// Bonus for a hand centred within the perfect radius of the item.
pub const PERFECT_CAPTURE_BONUS: i32 = 5;
/// Bonus for a catch in the bottom band of the screen.
pub const EXTREME_CAPTURE_BONUS: i32 = 10;
/// Bottom fraction of the screen that counts as an extreme catch.
pub const EXTREME_CAPTURE_BAND: f32 = 0.15;
/// Bonus for two or more positive catches by one player in one tick.
pub const MULTI_CAPTURE_BONUS: i32 = 20;
/// Combo counts that raise a milestone event.
pub const COMBO_MILESTONES: [u32; 4] = [2, 5, 10, 20];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::P1, Player::P2];

    pub fn index(self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Player::P1 => palette::P1,
            Player::P2 => palette::P2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Player::P1 => "P1",
            Player::P2 => "P2",
        }
    }
}

/// Score multiplier for a combo count.
pub fn combo_multiplier(count: u32) -> f32 {
    match count {
        c if c >= 20 => 3.0,
        c if c >= 10 => 2.0,
        c if c >= 5 => 1.5,
        c if c >= 2 => 1.2,
        _ => 1.0,
    }
}

/// Running combo for one player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Combo {
    pub count: u32,
    pub timer: f32,
}

impl Combo {
    /// Count down; an expired timer clears the count.
    pub fn tick(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
        if self.timer <= 0.0 {
            self.count = 0;
        }
    }

    /// Positive capture: extend the chain. Returns the new count.
    pub fn hit(&mut self, timeout: f32) -> u32 {
        self.count += 1;
        self.timer = timeout;
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.timer = 0.0;
    }

    pub fn multiplier(&self) -> f32 {
        combo_multiplier(self.count)
    }
}

/// Player credited for a hand at camera-space `hand_x`.
///
/// Zone mode uses the mirrored position of the hand. In the shared band the
/// person's torso (or the hand, if no torso is visible) decides which half
/// of the screen they stand on.
pub fn assign_player(
    mode: PlayerAssignment,
    hand_x: f32,
    person: Option<&Person>,
    screen_w: f32,
) -> Player {
    if mode == PlayerAssignment::Single {
        return Player::P1;
    }
    let display_x = mirror_x(hand_x, screen_w);
    match zone_at_display_x(display_x, screen_w) {
        Zone::Player1 => Player::P1,
        Zone::Player2 => Player::P2,
        Zone::Shared => {
            let anchor_x = person
                .and_then(|p| p.torso())
                .map(|t| mirror_x(t.x, screen_w))
                .unwrap_or(display_x);
            if anchor_x < screen_w * 0.5 {
                Player::P1
            } else {
                Player::P2
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popcorn_core::{Keypoint, NUM_KEYPOINTS};

    #[test]
    fn test_multiplier_steps() {
        assert_eq!(combo_multiplier(0), 1.0);
        assert_eq!(combo_multiplier(1), 1.0);
        assert_eq!(combo_multiplier(2), 1.2);
        assert_eq!(combo_multiplier(4), 1.2);
        assert_eq!(combo_multiplier(5), 1.5);
        assert_eq!(combo_multiplier(10), 2.0);
        assert_eq!(combo_multiplier(19), 2.0);
        assert_eq!(combo_multiplier(20), 3.0);
        assert_eq!(combo_multiplier(99), 3.0);
    }

    #[test]
    fn test_combo_expires() {
        let mut c = Combo::default();
        c.hit(COMBO_TIMEOUT);
        c.hit(COMBO_TIMEOUT);
        assert_eq!(c.count, 2);
        c.tick(1.9);
        assert_eq!(c.count, 2);
        c.tick(0.2);
        assert_eq!(c.count, 0);
        assert_eq!(c.timer, 0.0);
    }

    #[test]
    fn test_combo_monotonic_under_fast_hits() {
        let mut c = Combo::default();
        let mut last = 0;
        for _ in 0..30 {
            c.tick(1.5);
            let now = c.hit(COMBO_TIMEOUT);
            assert!(now > last);
            last = now;
        }
    }

    #[test]
    fn test_zone_assignment() {
        let w = 1000.0;
        // Camera-space right edge shows on the user's left: P1.
        assert_eq!(assign_player(PlayerAssignment::Zone, 900.0, None, w), Player::P1);
        assert_eq!(assign_player(PlayerAssignment::Zone, 100.0, None, w), Player::P2);
        assert_eq!(assign_player(PlayerAssignment::Single, 100.0, None, w), Player::P1);
    }

    #[test]
    fn test_shared_zone_uses_torso() {
        let w = 1000.0;
        let mut kps = [Keypoint::missing(); NUM_KEYPOINTS];
        // Torso at camera x = 200 → display x = 800 (P2 side).
        kps[5] = Keypoint::new(180.0, 300.0, 0.9, 0.3);
        kps[6] = Keypoint::new(220.0, 300.0, 0.9, 0.3);
        let person = Person::new(0, kps);
        // Hand at camera x = 560 → display 440, inside the shared band.
        assert_eq!(
            assign_player(PlayerAssignment::Zone, 560.0, Some(&person), w),
            Player::P2
        );
        // Without a torso the hand's own half decides.
        let bare = Person::new(1, [Keypoint::missing(); NUM_KEYPOINTS]);
        assert_eq!(
            assign_player(PlayerAssignment::Zone, 560.0, Some(&bare), w),
            Player::P1
        );
    }
}
