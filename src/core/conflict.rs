//! Keycode conflict detection for gesture sets
//!
//! The downstream dispatcher receives a keycode → action table. If two
//! gestures report the same scancode, the dispatcher cannot tell them
//! apart and only one of their actions will ever fire. This module finds
//! those collisions so they can be reported.
//!
//! # Performance
//! - Add gesture: O(1) average case
//! - List all conflicts: O(n) where n = number of unique keycodes

use std::collections::HashMap;
use crate::core::types::Gesture;

/// Detects gestures that share a hardware keycode.
///
/// Uses a HashMap where keys are keycodes and values are all gestures
/// reporting that keycode. A conflict exists when any vector has length > 1.
pub struct ConflictDetector {
    /// Maps keycode to all gestures using it.
    gestures: HashMap<i32, Vec<Gesture>>,
}

/// Represents a keycode shared by two or more gestures.
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    /// The shared keycode
    pub keycode: i32,

    /// All gestures using this keycode (always 2 or more), in insertion order
    pub conflicting_gestures: Vec<Gesture>,
}

impl ConflictDetector {
    /// Creates a new empty conflict detector.
    pub fn new() -> Self {
        Self {
            gestures: HashMap::new(),
        }
    }

    /// Builds a detector over a whole gesture set.
    pub fn from_gestures(gestures: &[Gesture]) -> Self {
        let mut detector = Self::new();
        for gesture in gestures {
            detector.add_gesture(gesture.clone());
        }
        detector
    }

    /// Adds a gesture to the detector.
    pub fn add_gesture(&mut self, gesture: Gesture) {
        self.gestures
            .entry(gesture.keycode)
            .or_default()
            .push(gesture);
    }

    /// Finds all conflicts, sorted by keycode.
    pub fn find_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts: Vec<Conflict> = self
            .gestures
            .iter()
            .filter(|(_, gestures)| gestures.len() > 1)
            .map(|(keycode, gestures)| Conflict {
                keycode: *keycode,
                conflicting_gestures: gestures.clone(),
            })
            .collect();

        conflicts.sort_by_key(|c| c.keycode);
        conflicts
    }

    /// Checks if a specific keycode is shared.
    pub fn has_conflict(&self, keycode: i32) -> bool {
        self.gestures
            .get(&keycode)
            .map(|gestures| gestures.len() > 1)
            .unwrap_or(false)
    }

    /// Returns the total number of gestures tracked.
    pub fn total_gestures(&self) -> usize {
        self.gestures.values().map(|v| v.len()).sum()
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}
