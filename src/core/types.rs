// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/types.rs
//!
//! Core type definitions for touchscreen gesture management
//!
//! This module defines the fundamental types used throughout the application:
//! - `Gesture`: A hardware-reported gesture (id, label, scancode)
//! - `Action`: What a gesture triggers when enabled (0 = disabled)
//! - `ActionMapping`: The complete gesture id → action table
//! - `GestureUpdate`: The keycode/action broadcast payload
//! - `GestureState`: One display row (gesture + action + effective state)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Preference key prefix for per-gesture actions
pub const GESTURE_KEY_PREFIX: &str = "touchscreen_gesture_";

/// Preference key holding the master enable switch
pub const GLOBAL_ENABLE_KEY: &str = "offscreen_gestures_enabled";

/// A hardware-reported touchscreen gesture
///
/// Created by a `GestureProvider` at query time and never mutated.
/// The `id` is unique within one result set and stable across boots.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Gesture {
    /// Stable hardware identifier
    pub id: i32,
    /// Display label (e.g., "swipe_up")
    pub name: String,
    /// Hardware scancode reported when the gesture fires
    pub keycode: i32,
}

impl Gesture {
    pub fn new(id: i32, name: &str, keycode: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            keycode,
        }
    }

    /// Preference key this gesture's action is stored under
    pub fn preference_key(&self) -> String {
        format!("{}{}", GESTURE_KEY_PREFIX, self.id)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} (keycode {})", self.id, self.name, self.keycode)
    }
}

/// Named action codes understood by the gesture dispatcher
const ACTION_NAMES: &[(i32, &str)] = &[
    (0, "none"),
    (1, "flashlight"),
    (2, "camera"),
    (3, "browser"),
    (4, "dialer"),
    (5, "email"),
    (6, "messages"),
    (7, "play_pause_music"),
    (8, "previous_track"),
    (9, "next_track"),
    (10, "volume_down"),
    (11, "volume_up"),
];

/// Action bound to a gesture
///
/// `0` means the gesture is disabled; any positive code is an enabled
/// action variant. Unknown positive codes pass through untouched so that
/// newer dispatchers can define their own.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Action(pub i32);

impl Action {
    pub const DISABLED: Action = Action(0);

    /// Whether this action should leave the gesture enabled at the hardware
    pub fn is_enabled(self) -> bool {
        self.0 > 0
    }

    /// Well-known name for this code, if any
    pub fn name(self) -> Option<&'static str> {
        ACTION_NAMES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }

    /// All named actions, in code order
    pub fn known() -> impl Iterator<Item = (Action, &'static str)> {
        ACTION_NAMES.iter().map(|(code, name)| (Action(*code), *name))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "action {}", self.0),
        }
    }
}

impl From<i32> for Action {
    fn from(code: i32) -> Self {
        Action(code)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(code) = trimmed.parse::<i32>() {
            return Ok(Action(code));
        }

        let lower = trimmed.to_lowercase();
        if lower == "disabled" || lower == "off" {
            return Ok(Action::DISABLED);
        }

        ACTION_NAMES
            .iter()
            .find(|(_, name)| *name == lower)
            .map(|(code, _)| Action(*code))
            .ok_or_else(|| {
                let names = ACTION_NAMES
                    .iter()
                    .map(|(_, name)| *name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Got {:?}, expected an integer or one of {}", s, names)
            })
    }
}

/// Complete gesture id → action table
///
/// Backed by a `BTreeMap` so iteration is always in ascending gesture id
/// order, which is the order the broadcast payload uses.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ActionMapping(BTreeMap<i32, Action>);

impl ActionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gesture_id: i32, action: Action) {
        self.0.insert(gesture_id, action);
    }

    pub fn get(&self, gesture_id: i32) -> Option<Action> {
        self.0.get(&gesture_id).copied()
    }

    /// Action for `gesture_id`, disabled when absent
    pub fn action_for(&self, gesture_id: i32) -> Action {
        self.get(gesture_id).unwrap_or(Action::DISABLED)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, Action)> + '_ {
        self.0.iter().map(|(id, action)| (*id, *action))
    }
}

impl FromIterator<(i32, Action)> for ActionMapping {
    fn from_iter<T: IntoIterator<Item = (i32, Action)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Broadcast payload: index-aligned keycodes and actions
///
/// Both sequences are ordered by ascending gesture id and always have the
/// same length. Serialises as `{"keycodes":[..],"actions":[..]}`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GestureUpdate {
    pub keycodes: Vec<i32>,
    pub actions: Vec<i32>,
}

impl GestureUpdate {
    /// Builds the payload for `gestures` from `mapping`
    ///
    /// Gestures are sorted by id first; gestures missing from the mapping
    /// are reported as disabled.
    pub fn from_mapping(gestures: &[Gesture], mapping: &ActionMapping) -> Self {
        let mut ordered: Vec<&Gesture> = gestures.iter().collect();
        ordered.sort_by_key(|g| g.id);

        let (keycodes, actions) = ordered
            .iter()
            .map(|g| (g.keycode, mapping.action_for(g.id).0))
            .unzip();

        Self { keycodes, actions }
    }

    pub fn len(&self) -> usize {
        self.keycodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keycodes.is_empty()
    }
}

/// One row of the current configuration, for display
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GestureState {
    pub gesture: Gesture,
    pub action: Action,
    /// What the hardware should currently have: global flag AND action > 0
    pub effective: bool,
}
