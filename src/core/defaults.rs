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

//! Device-specific default actions
//!
//! Some devices ship with gestures pre-bound (e.g., double-tap to wake).
//! The table is static configuration injected at startup; when no table
//! is supplied every gesture defaults to disabled.
//!
//! # File Format
//!
//! ```json
//! {
//!   "by_id":   { "0": 2 },
//!   "by_name": { "swipe_up": "flashlight" }
//! }
//! ```
//!
//! Lookups check `by_id` first, then `by_name`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::types::{Action, ActionMapping, Gesture};

/// Errors loading a default-action table
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("Failed to read defaults file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid defaults file: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Unknown action '{value}' for '{key}'")]
    UnknownAction { key: String, value: String },
}

/// Raw on-disk shape; values may be integers or action names
#[derive(Debug, Default, Deserialize)]
struct DefaultsFile {
    #[serde(default)]
    by_id: HashMap<String, ActionValue>,
    #[serde(default)]
    by_name: HashMap<String, ActionValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ActionValue {
    Code(i32),
    Name(String),
}

impl ActionValue {
    fn resolve(&self, key: &str) -> Result<Action, DefaultsError> {
        match self {
            ActionValue::Code(code) => Ok(Action(*code)),
            ActionValue::Name(name) => name.parse().map_err(|_| DefaultsError::UnknownAction {
                key: key.to_string(),
                value: name.clone(),
            }),
        }
    }
}

/// Injected override table for default gesture actions
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DefaultActions {
    by_id: HashMap<i32, Action>,
    by_name: HashMap<String, Action>,
}

impl DefaultActions {
    /// Empty table: every gesture defaults to disabled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, gesture_id: i32, action: Action) -> Self {
        self.by_id.insert(gesture_id, action);
        self
    }

    pub fn with_name(mut self, gesture_name: &str, action: Action) -> Self {
        self.by_name.insert(gesture_name.to_string(), action);
        self
    }

    /// Parses a JSON defaults table
    pub fn from_json(content: &str) -> Result<Self, DefaultsError> {
        let raw: DefaultsFile = serde_json::from_str(content)?;
        let mut table = Self::new();

        for (key, value) in &raw.by_id {
            let id = key.trim().parse::<i32>().map_err(|_| DefaultsError::UnknownAction {
                key: key.clone(),
                value: "gesture id must be an integer".to_string(),
            })?;
            table.by_id.insert(id, value.resolve(key)?);
        }

        for (name, value) in &raw.by_name {
            table.by_name.insert(name.clone(), value.resolve(name)?);
        }

        Ok(table)
    }

    /// Reads and parses a JSON defaults table from disk
    pub fn load(path: &Path) -> Result<Self, DefaultsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Override for `gesture`, if the table has one
    pub fn lookup(&self, gesture: &Gesture) -> Option<Action> {
        self.by_id
            .get(&gesture.id)
            .or_else(|| self.by_name.get(&gesture.name))
            .copied()
    }

    /// Default mapping for `gestures`: table value, else disabled
    pub fn compute(&self, gestures: &[Gesture]) -> ActionMapping {
        gestures
            .iter()
            .map(|g| (g.id, self.lookup(g).unwrap_or(Action::DISABLED)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() && self.by_name.is_empty()
    }
}
