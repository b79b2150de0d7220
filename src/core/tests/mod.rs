//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Keycode conflict detection tests
//! - Gesture set validation tests
//! - Type tests (Action, ActionMapping, GestureUpdate, etc.)
//! - Default action table tests
