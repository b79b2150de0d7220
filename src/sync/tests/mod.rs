//! Sync module tests
//!
//! Collaborators are hand-written mocks sharing state through
//! `Rc<RefCell<..>>`, so a test keeps a handle after moving a clone into
//! `GestureConfigSync`.


use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::config::{ConfigError, MemoryPreferenceStore, PreferenceStore};
use crate::core::Gesture;
use crate::hal::{GestureActuator, GestureProvider, HalError};
use crate::ipc::RecordingSink;
use crate::sync::GestureConfigSync;

#[derive(Debug, Default)]
struct HardwareState {
    /// `None` simulates an unreachable gesture service
    gestures: Option<Vec<Gesture>>,
    failing: HashSet<i32>,
    calls: Vec<(i32, bool)>,
}

/// Mock touch controller acting as both provider and actuator
#[derive(Clone, Debug, Default)]
pub(super) struct MockHardware {
    state: Rc<RefCell<HardwareState>>,
}

impl MockHardware {
    pub fn with_gestures(gestures: Vec<Gesture>) -> Self {
        let hardware = Self::default();
        hardware.state.borrow_mut().gestures = Some(gestures);
        hardware
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_gestures(&self, gestures: Option<Vec<Gesture>>) {
        self.state.borrow_mut().gestures = gestures;
    }

    /// Makes `set_enabled` fail for `gesture_id`
    pub fn fail_for(&self, gesture_id: i32) {
        self.state.borrow_mut().failing.insert(gesture_id);
    }

    pub fn calls(&self) -> Vec<(i32, bool)> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }
}

impl GestureProvider for MockHardware {
    fn supported_gestures(&self) -> Result<Vec<Gesture>, HalError> {
        self.state
            .borrow()
            .gestures
            .clone()
            .ok_or_else(|| HalError::Unavailable("mock service down".to_string()))
    }
}

impl GestureActuator for MockHardware {
    fn set_enabled(&self, gesture: &Gesture, enabled: bool) -> Result<(), HalError> {
        let mut state = self.state.borrow_mut();
        state.calls.push((gesture.id, enabled));

        if state.failing.contains(&gesture.id) {
            return Err(HalError::Rejected {
                gesture_id: gesture.id,
                reason: "mock rejection".to_string(),
            });
        }
        Ok(())
    }
}

/// Memory store with a handle kept by the test
#[derive(Clone, Debug, Default)]
pub(super) struct SharedStore {
    inner: Rc<RefCell<MemoryPreferenceStore>>,
}

impl SharedStore {
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryPreferenceStore::with_entries(
                entries.iter().copied(),
            ))),
        }
    }

    pub fn write_count(&self) -> usize {
        self.inner.borrow().write_count()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().set_fail_writes(fail);
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key)
    }
}

impl PreferenceStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.inner.borrow_mut().put(key, value)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys()
    }
}

/// The two-gesture panel used throughout
pub(super) fn swipe_gestures() -> Vec<Gesture> {
    vec![
        Gesture::new(0, "swipe_up", 100),
        Gesture::new(1, "swipe_down", 101),
    ]
}

pub(super) struct Fixture {
    pub sync: GestureConfigSync,
    pub hardware: MockHardware,
    pub store: SharedStore,
    pub sink: RecordingSink,
}

/// Builds a sync core over `gestures` and `entries`, with gestures loaded
pub(super) fn fixture(gestures: Vec<Gesture>, entries: &[(&str, &str)]) -> Fixture {
    let hardware = MockHardware::with_gestures(gestures);
    let store = SharedStore::with_entries(entries);
    let sink = RecordingSink::new();

    let mut sync = GestureConfigSync::new(
        hardware.clone(),
        hardware.clone(),
        store.clone(),
        sink.clone(),
    );
    sync.load_gestures().unwrap();

    Fixture {
        sync,
        hardware,
        store,
        sink,
    }
}
