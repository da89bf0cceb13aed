//! Static item and phase tables.

use popcorn_core::Rgb;

/// Falling item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Popcorn,
    Ticket,
    Cola,
    Filmroll,
    Bomb,
}

impl ItemType {
    pub const ALL: [ItemType; 5] = [
        ItemType::Popcorn,
        ItemType::Ticket,
        ItemType::Cola,
        ItemType::Filmroll,
        ItemType::Bomb,
    ];

    pub fn config(self) -> &'static ItemConfig {
        &ITEM_CONFIGS[self as usize]
    }

    pub fn score(self) -> i32 {
        self.config().score
    }

    pub fn is_bomb(self) -> bool {
        self == ItemType::Bomb
    }

    pub fn is_high_value(self) -> bool {
        self.score() >= HIGH_VALUE_SCORE
    }
}

/// Items worth at least this many points get a golden glow.
pub const HIGH_VALUE_SCORE: i32 = 50;

/// Per-type configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemConfig {
    pub name: &'static str,
    pub score: i32,
    pub color: Rgb,
    /// Diameter in pixels.
    pub size: f32,
    pub speed_multiplier: f32,
    pub spawn_weight: u32,
}

/// Indexed by `ItemType as usize`.
pub const ITEM_CONFIGS: [ItemConfig; 5] = [
    ItemConfig {
        name: "Popcorn",
        score: 10,
        color: Rgb::from_hex(0xFFFFCC),
        size: 65.0,
        speed_multiplier: 0.8,
        spawn_weight: 40,
    },
    ItemConfig {
        name: "Ticket",
        score: 25,
        color: Rgb::from_hex(0xFF6B35),
        size: 70.0,
        speed_multiplier: 1.0,
        spawn_weight: 22,
    },
    ItemConfig {
        name: "Cola",
        score: 50,
        color: Rgb::from_hex(0xFF0000),
        size: 75.0,
        speed_multiplier: 1.2,
        spawn_weight: 15,
    },
    ItemConfig {
        name: "Filmroll",
        score: 100,
        color: Rgb::from_hex(0xFFD700),
        size: 85.0,
        speed_multiplier: 1.2,
        spawn_weight: 15,
    },
    ItemConfig {
        name: "Bomb",
        score: -30,
        color: Rgb::from_hex(0xFF0000),
        size: 70.0,
        speed_multiplier: 1.0,
        spawn_weight: 8,
    },
];

/// Spawn weights in cumulative-roll order. Sums to [`TOTAL_SPAWN_WEIGHT`].
pub const ITEM_SPAWN_WEIGHTS: [(ItemType, u32); 5] = [
    (ItemType::Popcorn, ITEM_CONFIGS[0].spawn_weight),
    (ItemType::Ticket, ITEM_CONFIGS[1].spawn_weight),
    (ItemType::Cola, ITEM_CONFIGS[2].spawn_weight),
    (ItemType::Filmroll, ITEM_CONFIGS[3].spawn_weight),
    (ItemType::Bomb, ITEM_CONFIGS[4].spawn_weight),
];

pub const TOTAL_SPAWN_WEIGHT: u32 = 100;

/// Item for a roll in `0..TOTAL_SPAWN_WEIGHT`. Out-of-range rolls give
/// popcorn.
pub fn item_for_roll(roll: u32) -> ItemType {
    let mut cumulative = 0;
    for (ty, weight) in ITEM_SPAWN_WEIGHTS {
        cumulative += weight;
        if roll < cumulative {
            return ty;
        }
    }
    ItemType::Popcorn
}

/// Difficulty phases in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Warmup,
    Rush,
    Finale,
}

/// Per-phase parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseConfig {
    pub duration_s: f32,
    /// Game time at which the phase begins.
    pub start_s: f32,
    pub fall_speed: f32,
    pub spawn_rate: f32,
    pub special_rate: f32,
    pub bomb_rate: f32,
    pub title: &'static str,
    pub subtitle: &'static str,
}

pub const PHASE_CONFIGS: [PhaseConfig; 3] = [
    PhaseConfig {
        duration_s: 15.0,
        start_s: 0.0,
        fall_speed: 400.0,
        spawn_rate: 4.0,
        special_rate: 0.10,
        bomb_rate: 0.05,
        title: "Warmup",
        subtitle: "Audience arriving",
    },
    PhaseConfig {
        duration_s: 15.0,
        start_s: 15.0,
        fall_speed: 620.0,
        spawn_rate: 6.0,
        special_rate: 0.25,
        bomb_rate: 0.10,
        title: "Rush",
        subtitle: "The crowd surges!",
    },
    PhaseConfig {
        duration_s: 15.0,
        start_s: 30.0,
        fall_speed: 880.0,
        spawn_rate: 8.0,
        special_rate: 0.40,
        bomb_rate: 0.08,
        title: "Finale",
        subtitle: "Final sprint!",
    },
];

impl GamePhase {
    pub const ALL: [GamePhase; 3] = [GamePhase::Warmup, GamePhase::Rush, GamePhase::Finale];

    pub fn config(self) -> &'static PhaseConfig {
        &PHASE_CONFIGS[self as usize]
    }

    /// Phase for an elapsed game time.
    pub fn at(game_time: f32) -> GamePhase {
        if game_time < PHASE_CONFIGS[1].start_s {
            GamePhase::Warmup
        } else if game_time < PHASE_CONFIGS[2].start_s {
            GamePhase::Rush
        } else {
            GamePhase::Finale
        }
    }

    /// Zero-based position in play order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Seconds between spawns.
    pub fn spawn_interval(self) -> f32 {
        1.0 / self.config().spawn_rate
    }
}

/// Total game length in seconds.
pub const GAME_DURATION: f32 = 45.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_100() {
        let total: u32 = ITEM_SPAWN_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert_eq!(total, TOTAL_SPAWN_WEIGHT);
    }

    #[test]
    fn test_config_table_matches_types() {
        for ty in ItemType::ALL {
            assert!(ty.config().size > 0.0);
        }
        assert_eq!(ItemType::Popcorn.score(), 10);
        assert_eq!(ItemType::Ticket.score(), 25);
        assert_eq!(ItemType::Cola.score(), 50);
        assert_eq!(ItemType::Filmroll.score(), 100);
        assert_eq!(ItemType::Bomb.score(), -30);
        assert!(ItemType::Cola.is_high_value());
        assert!(!ItemType::Ticket.is_high_value());
        assert!(ItemType::Bomb.is_bomb());
        assert!(!ItemType::Bomb.is_high_value());
    }

    #[test]
    fn test_roll_boundaries() {
        assert_eq!(item_for_roll(0), ItemType::Popcorn);
        assert_eq!(item_for_roll(39), ItemType::Popcorn);
        assert_eq!(item_for_roll(40), ItemType::Ticket);
        assert_eq!(item_for_roll(61), ItemType::Ticket);
        assert_eq!(item_for_roll(62), ItemType::Cola);
        assert_eq!(item_for_roll(77), ItemType::Filmroll);
        assert_eq!(item_for_roll(91), ItemType::Filmroll);
        assert_eq!(item_for_roll(92), ItemType::Bomb);
        assert_eq!(item_for_roll(99), ItemType::Bomb);
        assert_eq!(item_for_roll(100), ItemType::Popcorn);
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(GamePhase::at(0.0), GamePhase::Warmup);
        assert_eq!(GamePhase::at(14.999), GamePhase::Warmup);
        assert_eq!(GamePhase::at(15.0), GamePhase::Rush);
        assert_eq!(GamePhase::at(29.999), GamePhase::Rush);
        assert_eq!(GamePhase::at(30.0), GamePhase::Finale);
        assert_eq!(GamePhase::at(44.0), GamePhase::Finale);
    }

    #[test]
    fn test_phases_cover_game() {
        let total: f32 = GamePhase::ALL.iter().map(|p| p.config().duration_s).sum();
        assert_eq!(total, GAME_DURATION);
        assert_eq!(GamePhase::Rush.config().spawn_rate, 6.0);
        assert_eq!(GamePhase::Finale.config().fall_speed, 880.0);
    }
}
