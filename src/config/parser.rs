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

//! src/config/parser.rs
//!
//! Preference file parser and writer
//!
//! The preference file is a flat list of `key = value` lines:
//!
//! ```text
//! # Touchscreen gesture preferences
//! offscreen_gestures_enabled = 1
//! touchscreen_gesture_0 = 5
//! touchscreen_gesture_1 = 0
//! ```
//!
//! - Blank lines and `#` comments are skipped
//! - Whitespace around `=` and at line ends is ignored
//! - A repeated key keeps its last value
//!
//! # Architecture
//! The line grammar uses nom combinators; the file-level loop tracks line
//! numbers for error reporting.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::{map, rest},
    IResult, Parser,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ConfigError;

/// Header written at the top of every rendered preference file
const FILE_HEADER: &str = "# Touchscreen gesture preferences\n\
                           # Managed by touch-gesture-manager; comments are not preserved\n";

/// Characters allowed in a preference key
pub fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

/// Checks that `key` can be written and read back unchanged
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    if !key.is_empty() && key.chars().all(is_key_char) {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_string()))
    }
}

/// Checks that `value` fits on a single line without surrounding whitespace loss
pub fn validate_value(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.contains('\n') || value.contains('\r') || value.trim() != value {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Parse a complete preference file
///
/// # Returns
/// All entries, or the first malformed line as `ConfigError::ParseFailed`
pub fn parse_preferences(content: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut entries = BTreeMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1;

        let line_trimmed = line.trim();
        if line_trimmed.is_empty() || line_trimmed.starts_with('#') {
            continue;
        }

        match parse_entry_line(line_trimmed) {
            Ok((_, (key, value))) => {
                if let Some(previous) = entries.insert(key.to_string(), value.to_string()) {
                    debug!(key, previous = %previous, line = line_num, "Preference key repeated; last value wins");
                }
            }
            Err(e) => {
                return Err(ConfigError::ParseFailed {
                    line: line_num,
                    message: format!("{:?}", e),
                });
            }
        }
    }

    Ok(entries)
}

/// Parse a single `key = value` line
///
/// The line must already be trimmed. The value is everything after `=`,
/// with surrounding whitespace removed, and may be empty.
pub fn parse_entry_line(input: &str) -> IResult<&str, (&str, &str)> {
    map(
        (take_while1(is_key_char), space0, char('='), space0, rest),
        |(key, _, _, _, value): (&str, &str, char, &str, &str)| (key, value.trim()),
    )
    .parse(input)
}

/// Render entries back into file form, sorted by key
pub fn render_preferences(entries: &BTreeMap<String, String>) -> String {
    let mut content = String::from(FILE_HEADER);

    for (key, value) in entries {
        content.push_str(key);
        content.push_str(" = ");
        content.push_str(value);
        content.push('\n');
    }

    content
}
