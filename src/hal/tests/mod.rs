//! HAL module tests
//!
//! Exercises the sysfs device against a manifest and fake enable nodes
//! inside a temporary directory.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::core::Gesture;
use crate::hal::{GestureActuator, GestureProvider, HalError, SysfsGestureDevice};

/// Helper: manifest with two relative nodes and one absolute node
fn create_test_device() -> (TempDir, SysfsGestureDevice) {
    let temp_dir = TempDir::new().unwrap();
    let absolute_node = temp_dir.path().join("abs_double_tap");
    fs::write(temp_dir.path().join("up_swipe_enable"), "0").unwrap();
    fs::write(temp_dir.path().join("down_swipe_enable"), "0").unwrap();
    fs::write(&absolute_node, "0").unwrap();

    let manifest = format!(
        r#"{{
            "gestures": [
                {{ "id": 1, "name": "swipe_down", "keycode": 101, "node": "down_swipe_enable" }},
                {{ "id": 0, "name": "swipe_up", "keycode": 100, "node": "up_swipe_enable" }},
                {{ "id": 2, "name": "double_tap", "keycode": 102, "node": {:?} }}
            ]
        }}"#,
        absolute_node.display().to_string()
    );
    let manifest_path = temp_dir.path().join("manifest.json");
    fs::write(&manifest_path, manifest).unwrap();

    (temp_dir, SysfsGestureDevice::new(manifest_path))
}

fn node(temp_dir: &TempDir, name: &str) -> PathBuf {
    temp_dir.path().join(name)
}

#[test]
fn test_supported_gestures_in_manifest_order() {
    let (_temp_dir, device) = create_test_device();

    let gestures = device.supported_gestures().unwrap();
    assert_eq!(
        gestures,
        vec![
            Gesture::new(1, "swipe_down", 101),
            Gesture::new(0, "swipe_up", 100),
            Gesture::new(2, "double_tap", 102),
        ]
    );
}

#[test]
fn test_relative_nodes_resolve_against_manifest_dir() {
    let (temp_dir, device) = create_test_device();

    let nodes = device.load_nodes().unwrap();
    assert_eq!(nodes[0].node, node(&temp_dir, "down_swipe_enable"));
    assert_eq!(nodes[2].node, node(&temp_dir, "abs_double_tap"));
}

#[test]
fn test_missing_manifest_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let device = SysfsGestureDevice::new(temp_dir.path().join("missing.json"));

    assert!(matches!(device.supported_gestures(), Err(HalError::Unavailable(_))));
}

#[test]
fn test_malformed_manifest_is_invalid() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join("manifest.json");
    fs::write(&manifest_path, r#"{ "gestures": [ { "id": "zero" } ] }"#).unwrap();

    let device = SysfsGestureDevice::new(manifest_path);
    assert!(matches!(device.supported_gestures(), Err(HalError::InvalidManifest(_))));
}

#[test]
fn test_set_enabled_writes_node() {
    let (temp_dir, device) = create_test_device();
    let swipe_up = Gesture::new(0, "swipe_up", 100);

    device.set_enabled(&swipe_up, true).unwrap();
    assert_eq!(fs::read_to_string(node(&temp_dir, "up_swipe_enable")).unwrap(), "1");

    device.set_enabled(&swipe_up, false).unwrap();
    assert_eq!(fs::read_to_string(node(&temp_dir, "up_swipe_enable")).unwrap(), "0");
}

#[test]
fn test_set_enabled_is_idempotent() {
    let (temp_dir, device) = create_test_device();
    let double_tap = Gesture::new(2, "double_tap", 102);

    device.set_enabled(&double_tap, true).unwrap();
    device.set_enabled(&double_tap, true).unwrap();
    assert_eq!(fs::read_to_string(node(&temp_dir, "abs_double_tap")).unwrap(), "1");
}

#[test]
fn test_set_enabled_unknown_gesture_rejected() {
    let (_temp_dir, device) = create_test_device();

    let result = device.set_enabled(&Gesture::new(42, "ghost", 1), true);
    assert!(matches!(result, Err(HalError::Rejected { gesture_id: 42, .. })));
}

#[test]
fn test_set_enabled_unwritable_node_rejected() {
    let (temp_dir, device) = create_test_device();

    // Replace the node with a directory so the write fails
    let path = node(&temp_dir, "down_swipe_enable");
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    let result = device.set_enabled(&Gesture::new(1, "swipe_down", 101), true);
    assert!(matches!(result, Err(HalError::Rejected { gesture_id: 1, .. })));
}
