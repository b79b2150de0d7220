use super::super::*;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Helper: Creates a temporary preference file for testing.
fn create_test_prefs() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let prefs_path = temp_dir.path().join("gestures.conf");
    fs::write(
        &prefs_path,
        "# Test prefs\noffscreen_gestures_enabled = 1\ntouchscreen_gesture_0 = 5\n",
    )
    .unwrap();
    (temp_dir, prefs_path)
}

#[test]
fn test_open_existing_file() {
    let (_temp_dir, prefs_path) = create_test_prefs();

    let prefs = PreferenceFile::open(prefs_path.clone());
    assert!(prefs.is_ok(), "Should open existing preference file");

    let prefs = prefs.unwrap();
    assert_eq!(prefs.path, prefs_path);
    assert_eq!(prefs.get("touchscreen_gesture_0"), Some("5".to_string()));
    assert_eq!(prefs.get("offscreen_gestures_enabled"), Some("1".to_string()));

    let backup_dir = prefs_path.parent().unwrap().join("backups");
    assert!(backup_dir.exists(), "Backup directory should be created");
}

#[test]
fn test_open_missing_file_creates_it() {
    let temp_dir = TempDir::new().unwrap();
    let prefs_path = temp_dir.path().join("nested").join("gestures.conf");

    let prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    assert!(prefs_path.exists(), "Missing preference file should be created");
    assert!(prefs.keys().is_empty(), "Fresh file has no entries");
}

#[test]
fn test_open_malformed_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let prefs_path = temp_dir.path().join("gestures.conf");
    fs::write(&prefs_path, "touchscreen_gesture_0 = 1\nthis is not a pair\n").unwrap();

    match PreferenceFile::open(prefs_path) {
        Err(ConfigError::ParseFailed { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected ParseFailed, got: {:?}", other),
    }
}

#[test]
fn test_get_or_default() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let prefs = PreferenceFile::open(prefs_path).unwrap();

    assert_eq!(prefs.get_or("touchscreen_gesture_0", "0"), "5");
    assert_eq!(prefs.get_or("touchscreen_gesture_9", "0"), "0");
}

#[test]
fn test_put_persists_to_disk() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    prefs.put("touchscreen_gesture_1", "2").unwrap();

    // A fresh handle must see the write
    let reopened = PreferenceFile::open(prefs_path).unwrap();
    assert_eq!(reopened.get("touchscreen_gesture_1"), Some("2".to_string()));
    assert_eq!(reopened.get("touchscreen_gesture_0"), Some("5".to_string()));
}

#[test]
fn test_put_creates_backup_of_previous_content() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let original = fs::read_to_string(&prefs_path).unwrap();
    let mut prefs = PreferenceFile::open(prefs_path).unwrap();

    prefs.put("touchscreen_gesture_0", "0").unwrap();

    let backups = prefs.list_backups().unwrap();
    assert_eq!(backups.len(), 1, "Write should leave one backup");
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), original);
}

#[test]
fn test_put_unchanged_value_skips_write() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path).unwrap();

    prefs.put("touchscreen_gesture_0", "5").unwrap();

    assert!(prefs.list_backups().unwrap().is_empty(), "No-op write should not back up");
}

#[test]
fn test_put_rejects_bad_key_and_value() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path.clone()).unwrap();
    let before = fs::read_to_string(&prefs_path).unwrap();

    assert!(matches!(prefs.put("bad key", "1"), Err(ConfigError::InvalidKey(_))));
    assert!(matches!(
        prefs.put("touchscreen_gesture_0", "1\nevil = 1"),
        Err(ConfigError::InvalidValue { .. })
    ));

    assert_eq!(fs::read_to_string(&prefs_path).unwrap(), before, "File must be untouched");
}

#[test]
fn test_reload_picks_up_external_edit() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    fs::write(&prefs_path, "touchscreen_gesture_3 = 7\n").unwrap();
    let count = prefs.reload().unwrap();

    assert_eq!(count, 1);
    assert_eq!(prefs.get("touchscreen_gesture_3"), Some("7".to_string()));
    assert_eq!(prefs.get("touchscreen_gesture_0"), None);
}

#[test]
fn test_symlink_allowed() {
    let temp_dir = TempDir::new().unwrap();
    let real_prefs = temp_dir.path().join("real.conf");
    let link_prefs = temp_dir.path().join("link.conf");

    fs::write(&real_prefs, "touchscreen_gesture_0 = 1\n").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::symlink;
        symlink(&real_prefs, &link_prefs).unwrap();

        let result = PreferenceFile::open(link_prefs);
        assert!(result.is_ok(), "Should allow symlinked preference files");
    }
}

#[test]
fn test_create_timestamped_backup() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    let backup_path = prefs.create_timestamped_backup().unwrap();

    assert!(backup_path.exists(), "Backup file should exist");
    assert_eq!(backup_path.parent().unwrap(), prefs.backup_dir);

    // "gestures.conf.2025-10-10_221500" -> "2025-10-10_221500"
    let filename = backup_path.file_name().unwrap().to_str().unwrap();
    let timestamp = filename.strip_prefix("gestures.conf.").unwrap();

    let parsed = chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d_%H%M%S");
    assert!(parsed.is_ok(), "Timestamp should be valid chrono format: {}", timestamp);

    assert_eq!(
        fs::read_to_string(&backup_path).unwrap(),
        fs::read_to_string(&prefs_path).unwrap()
    );
}

#[test]
fn test_list_backups_sorted_newest_first() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    let backup1 = prefs.create_timestamped_backup().unwrap();
    thread::sleep(Duration::from_secs(1));

    fs::write(&prefs_path, "touchscreen_gesture_0 = 1\n").unwrap();
    let backup2 = prefs.create_timestamped_backup().unwrap();
    thread::sleep(Duration::from_secs(1));

    fs::write(&prefs_path, "touchscreen_gesture_0 = 2\n").unwrap();
    let backup3 = prefs.create_timestamped_backup().unwrap();

    let backups = prefs.list_backups().unwrap();
    assert_eq!(backups, vec![backup3, backup2, backup1]);
}

#[test]
fn test_list_backups_ignores_invalid_files() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let prefs = PreferenceFile::open(prefs_path).unwrap();

    let valid_backup = prefs.create_timestamped_backup().unwrap();

    let backup_dir = prefs.backup_dir().to_path_buf();
    fs::write(backup_dir.join("random.txt"), "not a backup").unwrap();
    fs::write(backup_dir.join("gestures.conf.notimestamp"), "wrong format").unwrap();
    fs::write(backup_dir.join("gestures.conf.2025-99-99_invalid"), "bad date").unwrap();
    fs::write(backup_dir.join("other.conf.2025-01-01_120000"), "other file").unwrap();

    let backups = prefs.list_backups().unwrap();
    assert_eq!(backups, vec![valid_backup]);
}

#[test]
fn test_cleanup_keeps_n_most_recent() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    let mut backup_paths = Vec::new();
    for i in 1..=4 {
        fs::write(&prefs_path, format!("touchscreen_gesture_0 = {}\n", i)).unwrap();
        backup_paths.push(prefs.create_timestamped_backup().unwrap());
        thread::sleep(Duration::from_secs(1));
    }

    let deleted = prefs.cleanup_old_backups(2).unwrap();
    assert_eq!(deleted, 2);

    let remaining = prefs.list_backups().unwrap();
    assert_eq!(remaining, vec![backup_paths[3].clone(), backup_paths[2].clone()]);
}

#[test]
fn test_cleanup_with_no_backups() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let prefs = PreferenceFile::open(prefs_path).unwrap();

    assert_eq!(prefs.cleanup_old_backups(5).unwrap(), 0);
}

#[test]
fn test_writes_respect_max_backups() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path.clone()).unwrap().with_max_backups(1);

    prefs.put("touchscreen_gesture_0", "1").unwrap();
    thread::sleep(Duration::from_secs(1));
    prefs.put("touchscreen_gesture_0", "2").unwrap();

    assert_eq!(prefs.list_backups().unwrap().len(), 1, "Only one backup should be kept");
}

#[test]
fn test_restore_backup_basic() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let original = fs::read_to_string(&prefs_path).unwrap();
    let mut prefs = PreferenceFile::open(prefs_path).unwrap();

    let backup_path = prefs.create_timestamped_backup().unwrap();
    thread::sleep(Duration::from_secs(1));

    prefs.put("touchscreen_gesture_0", "0").unwrap();
    assert_eq!(prefs.get("touchscreen_gesture_0"), Some("0".to_string()));

    thread::sleep(Duration::from_secs(1));
    prefs.restore_backup(&backup_path).unwrap();

    assert_eq!(prefs.read_config().unwrap(), original, "Content should match the backup");
    assert_eq!(
        prefs.get("touchscreen_gesture_0"),
        Some("5".to_string()),
        "In-memory copy should be reloaded"
    );
}

#[test]
fn test_restore_creates_safety_backup() {
    let (_temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path.clone()).unwrap();

    let first_backup = prefs.create_timestamped_backup().unwrap();
    thread::sleep(Duration::from_secs(1));

    let current_content = "touchscreen_gesture_0 = 9\n";
    fs::write(&prefs_path, current_content).unwrap();

    prefs.restore_backup(&first_backup).unwrap();

    let backups = prefs.list_backups().unwrap();
    assert_eq!(backups.len(), 2, "Original backup + safety backup");
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), current_content);
}

#[test]
fn test_restore_nonexistent_backup_fails() {
    let (temp_dir, prefs_path) = create_test_prefs();
    let original = fs::read_to_string(&prefs_path).unwrap();
    let mut prefs = PreferenceFile::open(prefs_path).unwrap();

    let fake_backup = temp_dir.path().join("nonexistent-backup.conf");

    match prefs.restore_backup(&fake_backup) {
        Err(ConfigError::BackupFailed(msg)) => assert!(msg.contains("does not exist")),
        other => panic!("Expected BackupFailed error, got: {:?}", other),
    }

    assert_eq!(prefs.read_config().unwrap(), original);
    assert!(prefs.list_backups().unwrap().is_empty(), "No safety backup on failure");
}

#[test]
fn test_restore_directory_path_fails() {
    let (temp_dir, prefs_path) = create_test_prefs();
    let mut prefs = PreferenceFile::open(prefs_path).unwrap();

    let dir_path = temp_dir.path().join("some_directory");
    fs::create_dir(&dir_path).unwrap();

    match prefs.restore_backup(&dir_path) {
        Err(ConfigError::BackupFailed(msg)) => assert!(msg.contains("not a file")),
        other => panic!("Expected BackupFailed error, got: {:?}", other),
    }
}

#[test]
fn test_restore_malformed_backup_fails() {
    let (temp_dir, prefs_path) = create_test_prefs();
    let original = fs::read_to_string(&prefs_path).unwrap();
    let mut prefs = PreferenceFile::open(prefs_path).unwrap();

    let bogus = temp_dir.path().join("bogus.conf");
    fs::write(&bogus, "no equals sign here\n").unwrap();

    assert!(matches!(prefs.restore_backup(&bogus), Err(ConfigError::BackupFailed(_))));
    assert_eq!(prefs.read_config().unwrap(), original);
}
