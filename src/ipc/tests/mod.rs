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

//! IPC module tests
//!
//! Live-mode tests bind a real Unix socket in a temporary directory.

use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::thread;
use tempfile::TempDir;

use crate::{
    core::GestureUpdate,
    ipc::{BroadcastClient, ClientMode, IpcError, RecordingSink, UpdateSink},
};

fn sample_update() -> GestureUpdate {
    GestureUpdate {
        keycodes: vec![100, 101],
        actions: vec![5, 0],
    }
}

#[test]
fn test_encode_is_single_json_line() {
    let line = BroadcastClient::encode(&sample_update()).unwrap();

    assert_eq!(line, "{\"keycodes\":[100,101],\"actions\":[5,0]}\n");
    assert_eq!(line.matches('\n').count(), 1, "Payload must be exactly one line");
}

#[test]
fn test_dryrun_mode_never_sends() {
    let temp_dir = TempDir::new().unwrap();
    let socket_path = temp_dir.path().join("missing.sock");

    // A Live client would fail here: the socket does not exist
    let mut client = BroadcastClient::new(ClientMode::DryRun, Some(socket_path));
    assert!(client.publish(&sample_update()).is_ok(), "DryRun should succeed without a socket");
}

#[test]
fn test_readonly_mode_blocks_publish() {
    let mut client = BroadcastClient::new(ClientMode::ReadOnly, None);

    let result = client.publish(&sample_update());
    assert!(matches!(result, Err(IpcError::ReadOnly)), "ReadOnly must refuse: {:?}", result);
}

#[test]
fn test_live_mode_missing_socket_not_connected() {
    let temp_dir = TempDir::new().unwrap();
    let mut client =
        BroadcastClient::new(ClientMode::Live, Some(temp_dir.path().join("absent.sock")));

    let result = client.publish(&sample_update());
    assert!(matches!(result, Err(IpcError::NotConnected(_))), "Got {:?}", result);
}

#[test]
fn test_live_mode_sends_over_socket() {
    let temp_dir = TempDir::new().unwrap();
    let socket_path = temp_dir.path().join("gestures.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();

    let reader = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();
        line
    });

    let mut client = BroadcastClient::new(ClientMode::Live, Some(socket_path));
    client.publish(&sample_update()).unwrap();
    drop(client);

    let received = reader.join().unwrap();
    let decoded: GestureUpdate = serde_json::from_str(received.trim_end()).unwrap();
    assert_eq!(decoded, sample_update());
}

#[test]
fn test_recording_sink_shares_log_between_clones() {
    let sink = RecordingSink::new();
    let mut handle = sink.clone();

    handle.publish(&sample_update()).unwrap();
    handle.publish(&GestureUpdate::default()).unwrap();

    assert_eq!(sink.count(), 2);
    assert_eq!(sink.updates()[0], sample_update());
    assert_eq!(sink.last(), Some(GestureUpdate::default()));
}

#[test]
fn test_recording_sink_simulated_failure_still_records() {
    let sink = RecordingSink::new();
    let mut handle = sink.clone();
    sink.set_fail(true);

    assert!(handle.publish(&sample_update()).is_err());
    assert_eq!(sink.count(), 1);
}
