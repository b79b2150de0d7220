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

//! Touchscreen hardware boundary
//!
//! Two traits describe everything the sync core needs from the touch
//! controller:
//!
//! - **`GestureProvider`**: enumerates the gestures the firmware supports
//! - **`GestureActuator`**: switches one gesture on or off
//!
//! `SysfsGestureDevice` implements both for kernels that expose one
//! enable node per gesture, described by a JSON manifest.
//!
//! # Example
//! ```no_run
//! use touch_gesture_manager::hal::{GestureProvider, SysfsGestureDevice};
//!
//! let device = SysfsGestureDevice::new("/etc/touch-gestures/manifest.json".into());
//! for gesture in device.supported_gestures()? {
//!     println!("{}", gesture);
//! }
//! # Ok::<(), touch_gesture_manager::hal::HalError>(())
//! ```

use thiserror::Error;

use crate::core::Gesture;

pub mod sysfs;

pub use sysfs::{GestureNode, SysfsGestureDevice};

/// Errors raised at the hardware boundary
#[derive(Debug, Error)]
pub enum HalError {
    /// The gesture service or device cannot be reached
    #[error("Touchscreen gesture hardware unavailable: {0}")]
    Unavailable(String),

    /// The hardware refused a single enable/disable request
    #[error("Gesture {gesture_id} rejected by hardware: {reason}")]
    Rejected { gesture_id: i32, reason: String },

    /// The gesture manifest is malformed
    #[error("Invalid gesture manifest: {0}")]
    InvalidManifest(String),
}

/// Read-only source of the gestures the hardware supports.
pub trait GestureProvider {
    /// Queries the hardware once.
    ///
    /// Ids in the result are unique and stable across boots. `Err` means
    /// the hardware could not be reached at all.
    fn supported_gestures(&self) -> Result<Vec<Gesture>, HalError>;
}

/// Applies enable/disable state to a gesture.
///
/// Implementations must be idempotent: setting the state a gesture
/// already has succeeds. Any timeout is the implementation's concern.
pub trait GestureActuator {
    fn set_enabled(&self, gesture: &Gesture, enabled: bool) -> Result<(), HalError>;
}

impl<T: GestureProvider + ?Sized> GestureProvider for Box<T> {
    fn supported_gestures(&self) -> Result<Vec<Gesture>, HalError> {
        (**self).supported_gestures()
    }
}

impl<T: GestureActuator + ?Sized> GestureActuator for Box<T> {
    fn set_enabled(&self, gesture: &Gesture, enabled: bool) -> Result<(), HalError> {
        (**self).set_enabled(gesture, enabled)
    }
}

#[cfg(test)]
mod tests;
