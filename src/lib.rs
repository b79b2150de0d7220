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

//! Touchscreen Gesture Manager
//!
//! Keeps screen-off touchscreen gestures consistent across the touch
//! controller, the user's stored preferences and the input layer that
//! dispatches gesture keycodes to actions.
//!
//! # Features
//!
//! - **Reconciliation:** Default-filled action table from partial storage
//! - **Hardware First:** Storage never records a state the hardware refused
//! - **Global Switch:** One flag turns every off-screen gesture off
//! - **Automatic Backups:** Timestamped backups before every preference write
//! - **Atomic Operations:** Safe file writes with rollback on failure
//! - **Broadcast:** One keycode/action message per configuration change
//!
//! # Architecture
//!
//! - **`core`:** Data model (gestures, actions, defaults, validation, conflicts)
//! - **`config`:** Preference storage (parsing, atomic updates, backups)
//! - **`hal`:** Touch controller boundary (provider, actuator, sysfs adapter)
//! - **`ipc`:** Update broadcast to the input layer
//! - **`sync`:** `GestureConfigSync`, the reconciliation core
//! - **`logging`:** `tracing` subscriber setup for the CLI
//! - **`watcher`:** Manifest change notifications for `watch`
//!
//! # Examples
//!
//! ## Restoring state at boot
//!
//! ```no_run
//! use touch_gesture_manager::config::PreferenceFile;
//! use touch_gesture_manager::hal::SysfsGestureDevice;
//! use touch_gesture_manager::ipc::{BroadcastClient, ClientMode};
//! use touch_gesture_manager::GestureConfigSync;
//!
//! let device = SysfsGestureDevice::new("/etc/touch-gestures/manifest.json".into());
//! let prefs = PreferenceFile::open("/var/lib/touch-gestures/gestures.conf".into())?;
//! let client = BroadcastClient::new(ClientMode::Live, None);
//!
//! let mut sync = GestureConfigSync::new(device.clone(), device, prefs, client);
//! let report = sync.restore_all();
//! println!("{} of {} gestures enabled", report.enabled, report.gestures);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading the effective mapping
//!
//! ```no_run
//! # use touch_gesture_manager::config::MemoryPreferenceStore;
//! # use touch_gesture_manager::hal::SysfsGestureDevice;
//! # use touch_gesture_manager::ipc::RecordingSink;
//! # use touch_gesture_manager::GestureConfigSync;
//! # let device = SysfsGestureDevice::new("/etc/touch-gestures/manifest.json".into());
//! # let mut sync = GestureConfigSync::new(device.clone(), device, MemoryPreferenceStore::new(), RecordingSink::new());
//! let gestures = sync.load_gestures()?.to_vec();
//! for (id, action) in sync.build_action_list(&gestures).iter() {
//!     println!("gesture {} → {}", id, action);
//! }
//! # Ok::<(), touch_gesture_manager::sync::SyncError>(())
//! ```

pub mod config;
pub mod core;
pub mod hal;
pub mod ipc;
pub mod logging;
pub mod sync;
pub mod watcher;

// Re-export commonly used types for convenience
pub use core::{Action, ActionMapping, Gesture, GestureUpdate};
pub use sync::{GestureConfigSync, RestoreReport, SyncError};
