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

//! Runtime settings for an emitter.
//!
//! Settings are human-readable RON documents, e.g.:
//!
//! ```ron
//! (
//!     label: Some("todo-model"),
//!     listener_warning_threshold: Some(32),
//!     trace_dispatch: true,
//! )
//! ```

use crate::error::EventError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The default number of listeners per event name above which a warning is logged.
pub const DEFAULT_LISTENER_WARNING_THRESHOLD: usize = 10;

/// Configuration shared by an emitter and everything it [`extends`](crate::Events::extends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// A name used in log lines to tell emitters apart.
    pub label: Option<String>,
    /// Warn once per event name when its listener list grows past this size.
    ///
    /// This is a leak diagnostic only; listeners are never refused.
    /// `None` disables the warning.
    pub listener_warning_threshold: Option<usize>,
    /// Log every dispatch at `trace` level.
    pub trace_dispatch: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            label: None,
            listener_warning_threshold: Some(DEFAULT_LISTENER_WARNING_THRESHOLD),
            trace_dispatch: false,
        }
    }
}

impl EventsConfig {
    /// Returns a copy of this configuration carrying the given label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parses a configuration from a RON document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, EventError> {
        Ok(ron::from_str(source)?)
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EventError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&source)?;
        log::debug!("Loaded events configuration from '{}'.", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_warns_past_ten_listeners() {
        let config = EventsConfig::default();
        assert_eq!(config.label, None);
        assert_eq!(config.listener_warning_threshold, Some(10));
        assert!(!config.trace_dispatch);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = EventsConfig::from_ron_str("(label: Some(\"model\"))").unwrap();
        assert_eq!(config.label.as_deref(), Some("model"));
        assert_eq!(
            config.listener_warning_threshold,
            Some(DEFAULT_LISTENER_WARNING_THRESHOLD)
        );
    }

    #[test]
    fn full_document() {
        let config = EventsConfig::from_ron_str(
            "(label: None, listener_warning_threshold: None, trace_dispatch: true)",
        )
        .unwrap();
        assert_eq!(config.listener_warning_threshold, None);
        assert!(config.trace_dispatch);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = EventsConfig::from_ron_str("(trace_dispatch: \"yes\")").unwrap_err();
        assert!(matches!(err, EventError::Config(_)));
    }

    #[test]
    fn with_label_overrides_label() {
        let config = EventsConfig::default().with_label("view");
        assert_eq!(config.label.as_deref(), Some("view"));
    }
}
