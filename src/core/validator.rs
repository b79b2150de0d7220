// Copyright 2025 bakri (tidynest@proton.me)
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

//! Validation of hardware-reported gesture sets
//!
//! Gesture sets come from vendor firmware, so they are checked before use:
//! - Gesture ids must be unique (they key the persisted preferences)
//! - Labels must be printable and of sane length
//! - Keycodes must be non-negative scancodes
//!
//! Duplicate ids are the only hard error: the later duplicates are dropped.
//! Everything else is reported but the gesture is kept, since the hardware
//! is the authority on what exists.

use std::collections::HashSet;
use thiserror::Error;
use crate::core::types::Gesture;

/// Longest label accepted without a warning
const MAX_NAME_LEN: usize = 64;

/// Validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Gesture id reported more than once
    #[error("Duplicate gesture id {0}: later entry dropped")]
    DuplicateId(i32),

    /// Gesture label is empty
    #[error("Gesture {0} has an empty name")]
    EmptyName(i32),

    /// Gesture label contains control characters or is too long
    #[error("Gesture {id} has an invalid name '{name}'")]
    InvalidName { id: i32, name: String },

    /// Scancodes are never negative
    #[error("Gesture {id} has a negative keycode {keycode}")]
    NegativeKeycode { id: i32, keycode: i32 },
}

/// Validates a gesture label
pub fn validate_name(gesture: &Gesture) -> Result<(), ValidationError> {
    if gesture.name.trim().is_empty() {
        return Err(ValidationError::EmptyName(gesture.id));
    }

    if gesture.name.len() > MAX_NAME_LEN || gesture.name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName {
            id: gesture.id,
            name: gesture.name.escape_debug().to_string(),
        });
    }

    Ok(())
}

/// Validates a single gesture
pub fn validate_gesture(gesture: &Gesture) -> Result<(), ValidationError> {
    validate_name(gesture)?;

    if gesture.keycode < 0 {
        return Err(ValidationError::NegativeKeycode {
            id: gesture.id,
            keycode: gesture.keycode,
        });
    }

    Ok(())
}

/// Validates a complete gesture set
///
/// Returns the usable gestures (first occurrence of each id, original
/// order preserved) and every issue found along the way.
pub fn validate_gesture_set(gestures: Vec<Gesture>) -> (Vec<Gesture>, Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(gestures.len());
    let mut issues = Vec::new();

    for gesture in gestures {
        if !seen.insert(gesture.id) {
            issues.push(ValidationError::DuplicateId(gesture.id));
            continue;
        }

        if let Err(e) = validate_gesture(&gesture) {
            issues.push(e);
        }

        kept.push(gesture);
    }

    (kept, issues)
}
