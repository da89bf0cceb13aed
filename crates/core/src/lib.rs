//! Popcorn core types shared across crates.
//!
//! Holds the perception data model (frames, keypoints, persons, hand gestures),
//! the runtime configuration, colour helpers, and the screen zone layout.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod person;

use nalgebra as na;

pub use na::Point2;

pub use color::Rgb;
pub use config::GameConfig;
pub use error::{CaptureError, ConfigError, PerceptionError};
pub use frame::Frame;
pub use gesture::{GestureResult, HandGesture};
pub use person::{Keypoint, KeypointIndex, Person, NUM_KEYPOINTS};

/// Default window width in pixels.
pub const SCREEN_WIDTH: u32 = 1920;
/// Default window height in pixels.
pub const SCREEN_HEIGHT: u32 = 1080;

/// Horizontal zone of the screen, as seen by the players (mirrored view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Left 40% of the displayed image.
    Player1,
    /// Middle 20%.
    Shared,
    /// Right 40% of the displayed image.
    Player2,
}

/// Fraction of the screen width owned by P1 (display space).
pub const ZONE_P1: f32 = 0.4;
/// Fraction of the screen width in the shared band.
pub const ZONE_SHARED: f32 = 0.2;
/// Fraction of the screen width owned by P2 (display space).
pub const ZONE_P2: f32 = 0.4;

/// Mirror an un-mirrored camera-space x coordinate into display space.
#[inline]
pub fn mirror_x(x: f32, width: f32) -> f32 {
    width - x
}

/// Zone that a display-space x coordinate falls in.
pub fn zone_at_display_x(display_x: f32, width: f32) -> Zone {
    let t = display_x / width;
    if t < ZONE_P1 {
        Zone::Player1
    } else if t <= ZONE_P1 + ZONE_SHARED {
        Zone::Shared
    } else {
        Zone::Player2
    }
}
