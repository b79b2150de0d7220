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

//! Gesture configuration reconciliation
//!
//! `GestureConfigSync` keeps three things consistent:
//!
//! 1. **Hardware**: which gestures the touch controller has enabled
//! 2. **Storage**: the user's chosen action per gesture, plus the global flag
//! 3. **Broadcast**: the keycode/action table the input layer dispatches on
//!
//! Ordering rules:
//! - Hardware is actuated *before* a choice is persisted, so storage never
//!   records a state the hardware refused.
//! - The broadcast only goes out after a successful write.
//! - Batch operations (`set_global_enable(false)`, `restore_all`) never
//!   abort on a single gesture failure.
//!
//! # Example
//! ```
//! use touch_gesture_manager::config::MemoryPreferenceStore;
//! use touch_gesture_manager::core::{Action, Gesture};
//! use touch_gesture_manager::hal::{GestureActuator, GestureProvider, HalError};
//! use touch_gesture_manager::ipc::RecordingSink;
//! use touch_gesture_manager::sync::GestureConfigSync;
//!
//! struct Panel;
//!
//! impl GestureProvider for Panel {
//!     fn supported_gestures(&self) -> Result<Vec<Gesture>, HalError> {
//!         Ok(vec![Gesture::new(0, "swipe_up", 100), Gesture::new(1, "swipe_down", 101)])
//!     }
//! }
//!
//! impl GestureActuator for Panel {
//!     fn set_enabled(&self, _gesture: &Gesture, _enabled: bool) -> Result<(), HalError> {
//!         Ok(())
//!     }
//! }
//!
//! let sink = RecordingSink::new();
//! let mut sync = GestureConfigSync::new(Panel, Panel, MemoryPreferenceStore::new(), sink.clone());
//!
//! let swipe_up = sync.load_gestures()?[0].clone();
//! sync.set_gesture_action(&swipe_up, Action(5))?;
//!
//! let update = sink.last().unwrap();
//! assert_eq!(update.keycodes, vec![100, 101]);
//! assert_eq!(update.actions, vec![5, 0]);
//! # Ok::<(), touch_gesture_manager::sync::SyncError>(())
//! ```

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PreferenceStore};
use crate::core::{
    validate_gesture_set, Action, ActionMapping, ConflictDetector, DefaultActions, Gesture,
    GestureState, GestureUpdate, GLOBAL_ENABLE_KEY,
};
use crate::hal::{GestureActuator, GestureProvider, HalError};
use crate::ipc::UpdateSink;

/// Per-gesture preference key, capturing the gesture id
#[allow(clippy::expect_used)]
static GESTURE_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^touchscreen_gesture_(-?\d+)$").expect("gesture key pattern should be valid regex")
});

/// Errors surfaced by `GestureConfigSync`
///
/// None of these are fatal: each means "this one thing did not change".
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Gesture hardware unavailable: {0}")]
    HardwareUnavailable(#[source] HalError),

    #[error("Hardware refused gesture {gesture_id}: {source}")]
    ActuationFailed { gesture_id: i32, source: HalError },

    #[error("Failed to persist '{key}': {source}")]
    StorageWriteFailed { key: String, source: ConfigError },

    #[error("No gesture matches '{0}'")]
    UnknownGesture(String),
}

/// Outcome of `restore_all`
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RestoreReport {
    /// Gestures in the current set
    pub gestures: usize,
    /// Gestures left enabled at the hardware
    pub enabled: usize,
    /// Gestures the actuator refused
    pub failed: usize,
}

/// Reconciles hardware, stored preferences and the broadcast table
pub struct GestureConfigSync {
    provider: Box<dyn GestureProvider>,
    actuator: Box<dyn GestureActuator>,
    store: Box<dyn PreferenceStore>,
    sink: Box<dyn UpdateSink>,
    defaults: DefaultActions,
    /// Validated result of the last `load_gestures`
    gestures: Vec<Gesture>,
}

impl GestureConfigSync {
    /// Creates a sync core with an empty default table and no gestures
    /// loaded. Call `load_gestures` or `restore_all` next.
    pub fn new(
        provider: impl GestureProvider + 'static,
        actuator: impl GestureActuator + 'static,
        store: impl PreferenceStore + 'static,
        sink: impl UpdateSink + 'static,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            actuator: Box::new(actuator),
            store: Box::new(store),
            sink: Box::new(sink),
            defaults: DefaultActions::new(),
            gestures: Vec::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: DefaultActions) -> Self {
        self.defaults = defaults;
        self
    }

    /// The current gesture set
    pub fn gestures(&self) -> &[Gesture] {
        &self.gestures
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    /// Queries the provider and caches the validated gesture set.
    ///
    /// Duplicate ids keep their first occurrence. Malformed names and
    /// shared keycodes are logged but the gestures are kept.
    ///
    /// # Errors
    ///
    /// `HardwareUnavailable` if the provider cannot be reached. The cached
    /// set is emptied, so later calls operate on no gestures.
    pub fn load_gestures(&mut self) -> Result<&[Gesture], SyncError> {
        let raw = match self.provider.supported_gestures() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Gesture provider unavailable, no gestures configurable");
                self.gestures.clear();
                return Err(SyncError::HardwareUnavailable(e));
            }
        };

        let (gestures, issues) = validate_gesture_set(raw);
        for issue in &issues {
            warn!(%issue, "Gesture set issue");
        }

        for conflict in ConflictDetector::from_gestures(&gestures).find_conflicts() {
            let ids: Vec<i32> = conflict.conflicting_gestures.iter().map(|g| g.id).collect();
            warn!(keycode = conflict.keycode, ?ids, "Gestures share a keycode");
        }

        debug!(count = gestures.len(), "Loaded gesture set");
        self.gestures = gestures;
        Ok(&self.gestures)
    }

    /// Default action for each gesture: the injected table's value, or
    /// disabled when the table has none.
    pub fn compute_defaults(&self, gestures: &[Gesture]) -> ActionMapping {
        self.defaults.compute(gestures)
    }

    /// Effective mapping for `gestures`, reading storage and filling gaps
    /// from `compute_defaults`.
    ///
    /// Has exactly one entry per gesture id passed in. Never writes.
    pub fn build_action_list(&self, gestures: &[Gesture]) -> ActionMapping {
        let defaults = self.compute_defaults(gestures);

        gestures
            .iter()
            .map(|gesture| {
                let key = gesture.preference_key();
                let action = match self.store.get(&key) {
                    None => defaults.action_for(gesture.id),
                    Some(raw) => match raw.trim().parse::<i32>() {
                        Ok(code) => Action(code),
                        Err(_) => {
                            warn!(%key, value = %raw, "Ignoring unparsable stored action");
                            defaults.action_for(gesture.id)
                        }
                    },
                };
                (gesture.id, action)
            })
            .collect()
    }

    /// Applies and persists a new action for one gesture.
    ///
    /// 1. Actuates `action.is_enabled()` at the hardware
    /// 2. Persists the action under the gesture's key
    /// 3. Publishes the full table once
    ///
    /// # Errors
    ///
    /// - `ActuationFailed`: nothing was written or published
    /// - `StorageWriteFailed`: hardware already changed, nothing published
    pub fn set_gesture_action(&mut self, gesture: &Gesture, action: Action) -> Result<(), SyncError> {
        self.actuator
            .set_enabled(gesture, action.is_enabled())
            .map_err(|source| {
                warn!(gesture = gesture.id, error = %source, "Actuation failed, not persisting");
                SyncError::ActuationFailed {
                    gesture_id: gesture.id,
                    source,
                }
            })?;

        let key = gesture.preference_key();
        self.store
            .put(&key, &action.0.to_string())
            .map_err(|source| SyncError::StorageWriteFailed {
                key: key.clone(),
                source,
            })?;

        info!(gesture = %gesture, %action, "Gesture action updated");
        self.publish_update();
        Ok(())
    }

    /// `set_gesture_action` for a gesture in the current set, selected by
    /// id or by name.
    pub fn set_gesture_action_by_ref(&mut self, selector: &str, action: Action) -> Result<(), SyncError> {
        let gesture = self
            .find_gesture(selector)
            .cloned()
            .ok_or_else(|| SyncError::UnknownGesture(selector.to_string()))?;

        self.set_gesture_action(&gesture, action)
    }

    fn find_gesture(&self, selector: &str) -> Option<&Gesture> {
        let selector = selector.trim();

        if let Ok(id) = selector.parse::<i32>() {
            if let Some(gesture) = self.gestures.iter().find(|g| g.id == id) {
                return Some(gesture);
            }
        }

        self.gestures.iter().find(|g| g.name == selector)
    }

    /// Whether off-screen gestures are globally enabled (default: off)
    ///
    /// Any non-zero integer reads as enabled, as does `true`. Anything
    /// else, including an absent key, reads as disabled.
    pub fn global_enabled(&self) -> bool {
        self.store
            .get(GLOBAL_ENABLE_KEY)
            .map(|value| parse_flag(&value))
            .unwrap_or(false)
    }

    /// Flips the global enable flag.
    ///
    /// Disabling first turns every gesture off at the hardware, ignoring
    /// individual failures. Enabling does not re-apply stored actions;
    /// `restore_all` does that. Publishes once either way, even when the
    /// flag write fails.
    pub fn set_global_enable(&mut self, enabled: bool) -> Result<(), SyncError> {
        if !enabled {
            for gesture in &self.gestures {
                if let Err(e) = self.actuator.set_enabled(gesture, false) {
                    warn!(gesture = gesture.id, error = %e, "Failed to disable gesture");
                }
            }
        }

        let written = self.store.put(GLOBAL_ENABLE_KEY, if enabled { "1" } else { "0" });
        self.publish_update();

        written.map_err(|source| SyncError::StorageWriteFailed {
            key: GLOBAL_ENABLE_KEY.to_string(),
            source,
        })?;

        info!(enabled, "Off-screen gestures toggled");
        Ok(())
    }

    /// Sends the current keycode/action table to the sink.
    ///
    /// Sink failures are logged only. Returns the payload that was sent.
    pub fn publish_update(&mut self) -> GestureUpdate {
        let mapping = self.build_action_list(&self.gestures);
        let update = GestureUpdate::from_mapping(&self.gestures, &mapping);

        if let Err(e) = self.sink.publish(&update) {
            warn!(error = %e, "Failed to publish gesture update");
        }

        update
    }

    /// Re-applies stored state to the hardware and republishes.
    ///
    /// Reloads the gesture set, then sets each gesture to
    /// `global && action > 0`. Never writes to storage, so running it
    /// repeatedly yields the same result.
    ///
    /// If the provider is unavailable nothing is actuated or published,
    /// so a transient outage does not clear the dispatcher's table.
    pub fn restore_all(&mut self) -> RestoreReport {
        if self.load_gestures().is_err() {
            return RestoreReport::default();
        }

        let global = self.global_enabled();
        let mapping = self.build_action_list(&self.gestures);
        let mut report = RestoreReport {
            gestures: self.gestures.len(),
            ..RestoreReport::default()
        };

        for gesture in &self.gestures {
            let enable = global && mapping.action_for(gesture.id).is_enabled();
            match self.actuator.set_enabled(gesture, enable) {
                Ok(()) if enable => report.enabled += 1,
                Ok(()) => {}
                Err(e) => {
                    warn!(gesture = gesture.id, error = %e, "Failed to restore gesture");
                    report.failed += 1;
                }
            }
        }

        self.publish_update();

        info!(
            gestures = report.gestures,
            enabled = report.enabled,
            failed = report.failed,
            "Restored gesture state"
        );
        report
    }

    /// Ids with a stored action but no gesture in the current set
    ///
    /// Typically left behind by a firmware update. Nothing is deleted.
    pub fn stale_entries(&self) -> Vec<i32> {
        let mut stale: Vec<i32> = self
            .store
            .keys()
            .iter()
            .filter_map(|key| GESTURE_KEY_PATTERN.captures(key))
            .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()))
            .filter(|id| !self.gestures.iter().any(|g| g.id == *id))
            .collect();

        stale.sort_unstable();
        stale.dedup();
        stale
    }

    /// One row per current gesture, in id order
    pub fn snapshot(&self) -> Vec<GestureState> {
        let global = self.global_enabled();
        let mapping = self.build_action_list(&self.gestures);

        let mut rows: Vec<GestureState> = self
            .gestures
            .iter()
            .map(|gesture| {
                let action = mapping.action_for(gesture.id);
                GestureState {
                    gesture: gesture.clone(),
                    action,
                    effective: global && action.is_enabled(),
                }
            })
            .collect();

        rows.sort_by_key(|row| row.gesture.id);
        rows
    }
}

/// Reads the stored global flag value
fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    match value.parse::<i64>() {
        Ok(code) => code != 0,
        Err(_) => value.eq_ignore_ascii_case("true"),
    }
}

#[cfg(test)]
mod tests;
