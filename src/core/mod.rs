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

//! src/core/mod.rs
//!
//! Core data model for touchscreen gesture management
//!
//! This module contains the fundamental data structures and pure logic:
//! - Type definitions for gestures, actions and the action mapping
//! - Injected device-specific default actions
//! - Gesture set validation (duplicate ids, malformed labels)
//! - Keycode conflict detection
//!
//! Nothing here touches hardware, storage or IPC, so all of it is
//! unit-testable without a device.

pub mod conflict;
pub mod defaults;
pub mod types;
pub mod validator;

pub use conflict::{Conflict, ConflictDetector};
pub use defaults::{DefaultActions, DefaultsError};
pub use types::*;
pub use validator::{validate_gesture, validate_gesture_set, ValidationError};

#[cfg(test)]
mod tests;
