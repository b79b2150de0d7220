//! Manifest change watcher
//!
//! Watches the directory holding the gesture manifest so that replacing
//! the file (remove + create, as package managers do) is seen as well as
//! in-place edits.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
    time::Duration,
};
use tracing::debug;

/// Quiet period used to coalesce bursts of events
const SETTLE_DELAY: Duration = Duration::from_millis(250);

pub struct ManifestWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    target: PathBuf,
}

impl ManifestWatcher {
    pub fn new(path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(ManifestWatcher {
            _watcher: watcher,
            rx,
            target: path.to_path_buf(),
        })
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) && event
            .paths
            .iter()
            .any(|p| p.file_name() == self.target.file_name())
    }

    /// Blocks until the manifest changes.
    ///
    /// Returns `false` once the watcher has shut down.
    pub fn wait_for_change(&self) -> bool {
        loop {
            match self.rx.recv() {
                Ok(Ok(event)) if self.is_relevant(&event) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    debug!(error = %e, "Watch error");
                    continue;
                }
                Err(_) => return false,
            }
        }

        // Drain the rest of the burst
        loop {
            match self.rx.recv_timeout(SETTLE_DELAY) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => return true,
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
    }
}
