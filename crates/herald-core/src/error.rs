// Copyright 2025 eraflo
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

//! Defines the error type surfaced by the Events capability.
//!
//! Binding, unbinding and listening never fail: malformed use degrades to a
//! no-op. The only failures are a user callback returning an error during
//! dispatch and configuration that cannot be read or parsed.

use crate::emitter::EmitterId;
use std::fmt;
use std::path::PathBuf;

/// An error produced by the Events capability.
#[derive(Debug)]
pub enum EventError {
    /// A callback invoked by `trigger` returned an error.
    ///
    /// Dispatch stops at the failing callback; handlers registered after it
    /// are not invoked for that call.
    Handler {
        /// The name of the event being dispatched.
        event: String,
        /// The emitter that raised the event.
        emitter: EmitterId,
        /// The error returned by the callback.
        source: anyhow::Error,
    },
    /// A configuration document could not be parsed.
    Config(ron::error::SpannedError),
    /// A configuration file could not be read.
    Io {
        /// The path of the file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::Handler {
                event,
                emitter,
                source,
            } => {
                write!(f, "Handler for event '{event}' on {emitter} failed: {source}")
            }
            EventError::Config(e) => write!(f, "Invalid events configuration: {e}"),
            EventError::Io { path, source } => {
                write!(
                    f,
                    "Failed to read events configuration from '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventError::Handler { source, .. } => Some(source.as_ref()),
            EventError::Config(e) => Some(e),
            EventError::Io { source, .. } => Some(source),
        }
    }
}

impl From<ron::error::SpannedError> for EventError {
    fn from(e: ron::error::SpannedError) -> Self {
        EventError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn handler_error_keeps_its_source() {
        let err = EventError::Handler {
            event: "change".to_string(),
            emitter: EmitterId::new(),
            source: anyhow::anyhow!("boom"),
        };
        let msg = err.to_string();
        assert!(msg.contains("'change'"));
        assert!(msg.ends_with("boom"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = EventError::Io {
            path: PathBuf::from("missing/events.ron"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing/events.ron"));
    }
}
