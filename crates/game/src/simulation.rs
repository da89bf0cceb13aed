//! Game state machine and per-tick update.
//!
//! The simulation is a pure function of `(state, dt, persons, gesture)` plus
//! its own seeded RNG. Everything it wants the outside world to react to
//! (effects, HUD banners) comes back as [`GameEvent`]s.

use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use popcorn_core::config::{PlayerAssignment, RulesConfig};
use popcorn_core::{GestureResult, Person, Rgb};

use crate::catalog::{GamePhase, ItemType};
use crate::collision::{detect_collisions, CollisionResult};
use crate::item::FallingItem;
use crate::scoring::{
    assign_player, Combo, Player, COMBO_MILESTONES, EXTREME_CAPTURE_BAND,
    EXTREME_CAPTURE_BONUS, MULTI_CAPTURE_BONUS, PERFECT_CAPTURE_BONUS,
};
use crate::spawner::Spawner;

/// Top-level game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Waiting for a player and an OK gesture.
    Calibrating,
    /// Optional lead-in before play.
    Countdown,
    Playing,
    Paused,
    GameOver,
}

/// A scored catch (positive item or bomb).
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub item_id: u64,
    pub item_type: ItemType,
    pub player: Player,
    pub person_id: u32,
    pub is_left_hand: bool,
    pub position: Point2<f32>,
    pub hand: Point2<f32>,
    /// Item base score (the collision's score change).
    pub base_score: i32,
    /// Points actually added to the player's score.
    pub points: i32,
    pub multiplier: f32,
    pub perfect: bool,
    pub extreme: bool,
    pub color: Rgb,
}

/// Things that happened during one update.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    CountdownStarted { seconds: f32 },
    Started,
    PhaseChanged { phase: GamePhase },
    Captured(Capture),
    BombHit(Capture),
    ComboMilestone { player: Player, combo: u32 },
    MultiCapture { player: Player, captures: u32, bonus: i32 },
    Paused,
    Resumed,
    GameOver { scores: [i32; 2], winner: Option<Player> },
}

pub struct GameSimulation {
    state: GameState,
    phase: GamePhase,
    width: f32,
    height: f32,
    rules: RulesConfig,
    items: Vec<FallingItem>,
    spawner: Spawner,
    scores: [i32; 2],
    combos: [Combo; 2],
    game_time: f32,
    remaining_time: f32,
    countdown_remaining: f32,
    persons: Vec<Person>,
    rng: StdRng,
    calibration_hint_ticks: u32,
}

impl GameSimulation {
    pub fn new(width: f32, height: f32, rules: RulesConfig) -> Self {
        let rng = match rules.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        log::info!("Game simulation initialized with size {}x{}", width, height);
        Self {
            state: GameState::Calibrating,
            phase: GamePhase::Warmup,
            width,
            height,
            remaining_time: rules.duration_s,
            rules,
            items: Vec::new(),
            spawner: Spawner::new(),
            scores: [0; 2],
            combos: [Combo::default(); 2],
            game_time: 0.0,
            countdown_remaining: 0.0,
            persons: Vec::new(),
            rng,
            calibration_hint_ticks: 0,
        }
    }

    /// Advance one tick.
    pub fn update(&mut self, dt: f32, persons: &[Person], gesture: &GestureResult) -> Vec<GameEvent> {
        self.persons = persons.to_vec();
        let dt = dt.max(0.0);
        let mut events = Vec::new();

        match self.state {
            GameState::Calibrating => {
                if !persons.is_empty() {
                    if gesture.any_ok() {
                        log::info!("OK gesture detected with a player present");
                        if self.rules.countdown_s > 0.0 {
                            self.state = GameState::Countdown;
                            self.countdown_remaining = self.rules.countdown_s;
                            events.push(GameEvent::CountdownStarted {
                                seconds: self.rules.countdown_s,
                            });
                        } else if self.start_game() {
                            events.push(GameEvent::Started);
                        }
                    } else {
                        self.calibration_hint_ticks += 1;
                        if self.calibration_hint_ticks % 60 == 0 {
                            log::debug!("Player detected, waiting for OK gesture");
                        }
                    }
                }
            }
            GameState::Countdown => {
                self.countdown_remaining -= dt;
                if self.countdown_remaining <= 0.0 && self.start_game() {
                    events.push(GameEvent::Started);
                }
            }
            GameState::Playing => self.tick_playing(dt, &mut events),
            GameState::Paused | GameState::GameOver => {}
        }
        events
    }

    fn tick_playing(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        // 1. Clock.
        self.game_time += dt;
        self.remaining_time -= dt;
        if self.remaining_time <= 0.0 {
            self.remaining_time = 0.0;
            self.state = GameState::GameOver;
            let winner = self.winner();
            log::info!(
                "Game over: P1 {} / P2 {}",
                self.scores[0],
                self.scores[1]
            );
            events.push(GameEvent::GameOver {
                scores: self.scores,
                winner,
            });
            return;
        }

        // 2. Phase.
        let phase = GamePhase::at(self.game_time);
        if phase != self.phase {
            self.phase = phase;
            log::debug!("Phase changed to {:?}", phase);
            events.push(GameEvent::PhaseChanged { phase });
        }

        // 3. Combos.
        for combo in self.combos.iter_mut() {
            combo.tick(dt);
        }

        // 4. Spawn.
        self.spawner
            .update(dt, self.phase, self.width, &mut self.rng, &mut self.items);

        // 5. Physics.
        for item in self.items.iter_mut() {
            item.step(dt);
        }

        // 6. Collisions and scoring.
        let hits = detect_collisions(&mut self.items, &self.persons, self.rules.hand_radius);
        self.apply_collisions(&hits, events);

        // 7. Prune.
        let h = self.height;
        self.items.retain(|item| !item.is_expired(h));
    }

    fn apply_collisions(&mut self, hits: &[CollisionResult], events: &mut Vec<GameEvent>) {
        let mut positive_captures = [0u32; 2];
        for hit in hits {
            let Some(item_type) = self.item_type_of(hit) else {
                continue;
            };
            let person = self.persons.iter().find(|p| p.id == hit.person_id);
            let player = assign_player(
                self.rules.player_assignment,
                hit.hand.x,
                person,
                self.width,
            );
            let idx = player.index();

            let perfect = hit.is_perfect(self.rules.perfect_radius);
            let extreme = hit.item_position.y >= self.height * (1.0 - EXTREME_CAPTURE_BAND);

            let mut milestone = None;
            let (points, multiplier) = if hit.score_change > 0 {
                let combo = self.combos[idx].hit(self.rules.combo_timeout_s);
                let multiplier = self.combos[idx].multiplier();
                let mut points = (hit.score_change as f32 * multiplier).round() as i32;
                if perfect {
                    points += PERFECT_CAPTURE_BONUS;
                }
                if extreme {
                    points += EXTREME_CAPTURE_BONUS;
                }
                positive_captures[idx] += 1;
                if COMBO_MILESTONES.contains(&combo) {
                    milestone = Some(combo);
                }
                (points, multiplier)
            } else {
                self.combos[idx].reset();
                (hit.score_change, 1.0)
            };
            self.scores[idx] += points;

            let capture = Capture {
                item_id: hit.item_id,
                item_type,
                player,
                person_id: hit.person_id,
                is_left_hand: hit.is_left_hand,
                position: hit.item_position,
                hand: hit.hand,
                base_score: hit.score_change,
                points,
                multiplier,
                perfect: perfect && hit.score_change > 0,
                extreme: extreme && hit.score_change > 0,
                color: item_type.config().color,
            };
            log::debug!(
                "{} caught {:?} for {} (combo x{:.1})",
                player.label(),
                item_type,
                points,
                multiplier
            );
            if item_type.is_bomb() {
                events.push(GameEvent::BombHit(capture));
            } else {
                events.push(GameEvent::Captured(capture));
            }
            if let Some(combo) = milestone {
                events.push(GameEvent::ComboMilestone { player, combo });
            }
        }

        for player in Player::ALL {
            let captures = positive_captures[player.index()];
            if captures >= 2 {
                self.scores[player.index()] += MULTI_CAPTURE_BONUS;
                events.push(GameEvent::MultiCapture {
                    player,
                    captures,
                    bonus: MULTI_CAPTURE_BONUS,
                });
            }
        }
    }

    fn item_type_of(&self, hit: &CollisionResult) -> Option<ItemType> {
        self.items
            .iter()
            .find(|i| i.id == hit.item_id)
            .map(|i| i.item_type)
    }

    /// Begin a fresh game from Calibrating, Countdown, or GameOver.
    pub fn start_game(&mut self) -> bool {
        match self.state {
            GameState::Calibrating | GameState::Countdown | GameState::GameOver => {
                self.clear_round();
                self.state = GameState::Playing;
                log::info!("Game started");
                true
            }
            GameState::Playing | GameState::Paused => false,
        }
    }

    /// Playing ↔ Paused. Returns the event, if the state changed.
    pub fn toggle_pause(&mut self) -> Option<GameEvent> {
        match self.state {
            GameState::Playing => {
                self.state = GameState::Paused;
                log::info!("Game paused");
                Some(GameEvent::Paused)
            }
            GameState::Paused => {
                self.state = GameState::Playing;
                log::info!("Game resumed");
                Some(GameEvent::Resumed)
            }
            _ => None,
        }
    }

    /// Back to Calibrating with an empty round.
    pub fn reset(&mut self) {
        self.clear_round();
        self.state = GameState::Calibrating;
        log::info!("Game reset");
    }

    fn clear_round(&mut self) {
        self.scores = [0; 2];
        self.combos = [Combo::default(); 2];
        self.game_time = 0.0;
        self.remaining_time = self.rules.duration_s;
        self.countdown_remaining = 0.0;
        self.phase = GamePhase::Warmup;
        self.items.clear();
        self.spawner.reset_timer();
    }

    /// Higher score wins; `None` on a draw.
    pub fn winner(&self) -> Option<Player> {
        match self.scores[0].cmp(&self.scores[1]) {
            std::cmp::Ordering::Greater => Some(Player::P1),
            std::cmp::Ordering::Less => Some(Player::P2),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    /// Persons passed to the last update.
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn score(&self, player: Player) -> i32 {
        self.scores[player.index()]
    }

    pub fn combo(&self, player: Player) -> Combo {
        self.combos[player.index()]
    }

    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    pub fn remaining_time(&self) -> f32 {
        self.remaining_time
    }

    pub fn duration(&self) -> f32 {
        self.rules.duration_s
    }

    pub fn countdown_remaining(&self) -> f32 {
        self.countdown_remaining.max(0.0)
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn player_assignment(&self) -> PlayerAssignment {
        self.rules.player_assignment
    }

    pub fn hand_radius(&self) -> f32 {
        self.rules.hand_radius
    }

    pub fn perfect_radius(&self) -> f32 {
        self.rules.perfect_radius
    }

    /// Place an item directly (scenario setup and tests).
    pub fn insert_item(&mut self, item_type: ItemType, x: f32, y: f32, speed: f32) -> u64 {
        let id = self.spawner.allocate_id();
        self.items.push(FallingItem::new(id, item_type, x, y, speed, 0.0));
        id
    }

    /// Restart the spawn interval (tests).
    #[cfg(test)]
    fn hold_spawner(&mut self) {
        self.spawner.reset_timer();
    }
}
