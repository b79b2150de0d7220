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

//! Sysfs-backed gesture device
//!
//! Many touch controller drivers expose each screen-off gesture as a
//! writable node (`/proc/touchpanel/up_swipe_enable` and similar) taking
//! `1` or `0`. The kernel does not describe which node belongs to which
//! gesture, so a JSON manifest supplies that:
//!
//! ```json
//! {
//!   "gestures": [
//!     { "id": 0, "name": "swipe_up",   "keycode": 255, "node": "/proc/touchpanel/up_swipe_enable" },
//!     { "id": 1, "name": "swipe_down", "keycode": 256, "node": "down_swipe_enable" }
//!   ]
//! }
//! ```
//!
//! Relative node paths resolve against the manifest's directory.
//! The manifest is re-read on every query, so a firmware update that
//! changes it is picked up without restarting.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::core::Gesture;
use crate::hal::{GestureActuator, GestureProvider, HalError};

/// One manifest entry: a gesture and its enable node
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct GestureNode {
    pub id: i32,
    pub name: String,
    pub keycode: i32,
    pub node: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    gestures: Vec<GestureNode>,
}

/// Gesture provider and actuator backed by per-gesture sysfs nodes
#[derive(Clone, Debug)]
pub struct SysfsGestureDevice {
    manifest_path: PathBuf,
}

impl SysfsGestureDevice {
    pub fn new(manifest_path: PathBuf) -> Self {
        Self { manifest_path }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Reads the manifest, resolving relative node paths
    ///
    /// A manifest that cannot be read means the device is unavailable;
    /// one that cannot be parsed is reported as invalid.
    pub fn load_nodes(&self) -> Result<Vec<GestureNode>, HalError> {
        let content = fs::read_to_string(&self.manifest_path).map_err(|e| {
            HalError::Unavailable(format!("{}: {}", self.manifest_path.display(), e))
        })?;

        let manifest: Manifest = serde_json::from_str(&content)
            .map_err(|e| HalError::InvalidManifest(format!("{}: {}", self.manifest_path.display(), e)))?;

        let base = self.manifest_path.parent().unwrap_or_else(|| Path::new(""));

        Ok(manifest
            .gestures
            .into_iter()
            .map(|mut entry| {
                if entry.node.is_relative() {
                    entry.node = base.join(&entry.node);
                }
                entry
            })
            .collect())
    }

    fn node_for(&self, gesture_id: i32) -> Result<PathBuf, HalError> {
        self.load_nodes()?
            .into_iter()
            .find(|entry| entry.id == gesture_id)
            .map(|entry| entry.node)
            .ok_or_else(|| HalError::Rejected {
                gesture_id,
                reason: "gesture not present in manifest".to_string(),
            })
    }
}

impl GestureProvider for SysfsGestureDevice {
    fn supported_gestures(&self) -> Result<Vec<Gesture>, HalError> {
        let gestures: Vec<Gesture> = self
            .load_nodes()?
            .into_iter()
            .map(|entry| Gesture {
                id: entry.id,
                name: entry.name,
                keycode: entry.keycode,
            })
            .collect();

        debug!(count = gestures.len(), manifest = %self.manifest_path.display(), "Queried gestures");
        Ok(gestures)
    }
}

impl GestureActuator for SysfsGestureDevice {
    fn set_enabled(&self, gesture: &Gesture, enabled: bool) -> Result<(), HalError> {
        let node = self.node_for(gesture.id)?;
        let value = if enabled { "1" } else { "0" };

        // Sysfs attributes cannot be replaced by rename; write in place
        fs::write(&node, value).map_err(|e| HalError::Rejected {
            gesture_id: gesture.id,
            reason: format!("{}: {}", node.display(), e),
        })?;

        trace!(gesture = gesture.id, node = %node.display(), value, "Wrote gesture node");
        Ok(())
    }
}
