//! Popcorn Battle game rules: the item catalog, falling items, collisions,
//! scoring, and the per-tick simulation.

pub mod catalog;
pub mod collision;
pub mod item;
pub mod scoring;
pub mod simulation;
pub mod spawner;

pub use catalog::{GamePhase, ItemConfig, ItemType, PhaseConfig, GAME_DURATION};
pub use collision::{detect_collisions, CollisionResult};
pub use item::FallingItem;
pub use scoring::{Combo, Player};
pub use simulation::{Capture, GameEvent, GameSimulation, GameState};
pub use spawner::Spawner;
