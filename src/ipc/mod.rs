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

//! Gesture update broadcast
//!
//! # Client Modes
//!
//! `BroadcastClient` operates in three modes:
//! - **DryRun**: Encodes the payload and logs it, never sends
//! - **ReadOnly**: Refuses to publish
//! - **Live**: Sends one JSON line per update (requires explicit opt-in)
//!
//! # Example
//! ```
//! use touch_gesture_manager::core::GestureUpdate;
//! use touch_gesture_manager::ipc::{BroadcastClient, ClientMode, UpdateSink};
//!
//! // Safe: DryRun mode encodes but never sends
//! let mut client = BroadcastClient::new(ClientMode::DryRun, None);
//!
//! let update = GestureUpdate { keycodes: vec![100, 101], actions: vec![5, 0] };
//! assert!(client.publish(&update).is_ok());
//! ```

use std::cell::RefCell;
use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::GestureUpdate;

/// Errors raised while broadcasting an update
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("Broadcast socket not reachable: {0}")]
    NotConnected(String),

    #[error("Failed to send update: {0}")]
    SendFailed(String),

    #[error("Client in read-only mode - cannot publish updates")]
    ReadOnly,

    #[error("Failed to encode update: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receiver of the keycode/action broadcast.
///
/// Receives one message per `GestureConfigSync::publish_update` call.
pub trait UpdateSink {
    fn publish(&mut self, update: &GestureUpdate) -> Result<(), IpcError>;
}

impl<T: UpdateSink + ?Sized> UpdateSink for Box<T> {
    fn publish(&mut self, update: &GestureUpdate) -> Result<(), IpcError> {
        (**self).publish(update)
    }
}

/// Broadcast client operation mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientMode {
    /// Encode only - NEVER sends
    DryRun,

    /// Cannot publish
    ReadOnly,

    /// Full access - requires explicit opt-in
    Live,
}

/// Sends gesture updates to the input layer
///
/// In Live mode each update is written as one line of JSON
/// (`{"keycodes":[..],"actions":[..]}`) to the configured Unix socket,
/// or to stdout when no socket is set so it can be piped elsewhere.
pub struct BroadcastClient {
    mode: ClientMode,
    socket: Option<PathBuf>,
}

impl BroadcastClient {
    pub fn new(mode: ClientMode, socket: Option<PathBuf>) -> Self {
        Self { mode, socket }
    }

    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    pub fn socket(&self) -> Option<&Path> {
        self.socket.as_deref()
    }

    /// Encodes an update as a single newline-terminated JSON line
    pub fn encode(update: &GestureUpdate) -> Result<String, IpcError> {
        let mut line = serde_json::to_string(update)?;
        line.push('\n');
        Ok(line)
    }

    fn send_to_socket(socket_path: &Path, line: &str) -> Result<(), IpcError> {
        if !socket_path.exists() {
            return Err(IpcError::NotConnected(format!(
                "{} not found - is the input service running?",
                socket_path.display()
            )));
        }

        let mut socket = UnixStream::connect(socket_path)
            .map_err(|e| IpcError::NotConnected(format!("{}: {}", socket_path.display(), e)))?;

        socket
            .write_all(line.as_bytes())
            .map_err(|e| IpcError::SendFailed(e.to_string()))?;
        let _ = socket.flush();

        Ok(())
    }

    fn send_to_stdout(line: &str) -> Result<(), IpcError> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(line.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| IpcError::SendFailed(e.to_string()))
    }
}

impl UpdateSink for BroadcastClient {
    fn publish(&mut self, update: &GestureUpdate) -> Result<(), IpcError> {
        let line = Self::encode(update)?;

        match self.mode {
            ClientMode::DryRun => {
                info!(payload = line.trim_end(), "Dry run: update not sent");
                Ok(())
            }
            ClientMode::ReadOnly => Err(IpcError::ReadOnly),
            ClientMode::Live => {
                match &self.socket {
                    Some(path) => Self::send_to_socket(path, &line)?,
                    None => Self::send_to_stdout(&line)?,
                }
                debug!(gestures = update.len(), "Published gesture update");
                Ok(())
            }
        }
    }
}

/// Sink that keeps every update in memory
///
/// Clones share the same log, so a test can hand one clone to
/// `GestureConfigSync` and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    updates: Rc<RefCell<Vec<GestureUpdate>>>,
    fail: Rc<RefCell<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent publishes fail (the update is still recorded)
    pub fn set_fail(&self, fail: bool) {
        *self.fail.borrow_mut() = fail;
    }

    pub fn updates(&self) -> Vec<GestureUpdate> {
        self.updates.borrow().clone()
    }

    pub fn last(&self) -> Option<GestureUpdate> {
        self.updates.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.updates.borrow().len()
    }
}

impl UpdateSink for RecordingSink {
    fn publish(&mut self, update: &GestureUpdate) -> Result<(), IpcError> {
        self.updates.borrow_mut().push(update.clone());
        if *self.fail.borrow() {
            return Err(IpcError::SendFailed("Simulated send failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
