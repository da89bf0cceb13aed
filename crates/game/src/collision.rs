//! Hand-versus-item collision detection.

use nalgebra::{distance, distance_squared, Point2};
use popcorn_core::{Keypoint, Person};

use crate::item::FallingItem;

/// Default hand radius in pixels.
pub const HAND_RADIUS: f32 = 50.0;
/// Hand centre within this distance of the item centre is a perfect catch.
pub const PERFECT_CAPTURE_RADIUS: f32 = 30.0;

/// One hand touching one item.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    pub item_id: u64,
    pub person_id: u32,
    pub is_left_hand: bool,
    /// Base score of the item.
    pub score_change: i32,
    pub hand: Point2<f32>,
    pub item_position: Point2<f32>,
    /// Centre-to-centre distance.
    pub distance: f32,
}

impl CollisionResult {
    pub fn is_perfect(&self, perfect_radius: f32) -> bool {
        self.distance <= perfect_radius
    }
}

/// Circle-versus-circle overlap test.
pub fn hand_hits_item(hand: &Keypoint, item: &FallingItem, hand_radius: f32) -> bool {
    let reach = hand_radius + item.radius();
    distance_squared(&hand.position(), &item.position()) <= reach * reach
}

/// Test every active item against both wrists of every person.
///
/// Persons are visited in id order and the left wrist before the right; the
/// first hit wins and deactivates the item, so an item collides at most once.
pub fn detect_collisions(
    items: &mut [FallingItem],
    persons: &[Person],
    hand_radius: f32,
) -> Vec<CollisionResult> {
    let mut ordered: Vec<&Person> = persons.iter().collect();
    ordered.sort_by_key(|p| p.id);

    let mut results = Vec::new();
    for item in items.iter_mut().filter(|i| i.active) {
        'persons: for person in &ordered {
            for (hand, is_left) in [(person.left_wrist(), true), (person.right_wrist(), false)] {
                if hand.valid && hand_hits_item(hand, item, hand_radius) {
                    results.push(CollisionResult {
                        item_id: item.id,
                        person_id: person.id,
                        is_left_hand: is_left,
                        score_change: item.score(),
                        hand: hand.position(),
                        item_position: item.position(),
                        distance: distance(&hand.position(), &item.position()),
                    });
                    item.capture();
                    break 'persons;
                }
            }
        }
    }
    results
}
