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

//! Cross-object subscription: [`Events::listen_to`] and [`Events::stop_listening`].
//!
//! Subscribing writes into two places. The *source* gets a listener record
//! appended to its listener index for the event name; the *listener* stores
//! the callback in its own slot for that name. A listener therefore holds one
//! callback per event name, shared by every source it listens to.

use crate::callback::Callback;
use crate::emitter::{lock, Events, ListenerRecord, ListenerSlot};
use std::sync::Arc;

/// Selects which subscriptions [`Events::stop_listening`] tears down.
#[derive(Debug, Clone, Copy)]
pub enum StopListening<'a> {
    /// Drop this emitter's listener callbacks and its records on every
    /// source it still listens to.
    ///
    /// Sources that were dropped in the meantime are skipped.
    All,
    /// Remove every record this emitter holds on the source, for all events.
    Source(&'a Events),
    /// Remove one record this emitter holds on the source for the event,
    /// and drop this emitter's callback for that name.
    SourceAndEvent(&'a Events, &'a str),
}

impl Events {
    /// Listens to `event` on `other`, running `callback` against this emitter.
    ///
    /// Subscribing twice to the same source and event appends a second record,
    /// so the callback runs twice per trigger. The callback replaces any
    /// callback this emitter registered earlier for `event`, whatever the source.
    pub fn listen_to(&self, other: &Events, event: impl Into<String>, callback: Callback) {
        self.subscribe(other, event.into(), callback, false);
    }

    /// Like [`listen_to`](Events::listen_to), but the record is removed from
    /// `other` after it fired once.
    pub fn listen_to_once(&self, other: &Events, event: impl Into<String>, callback: Callback) {
        self.subscribe(other, event.into(), callback, true);
    }

    fn subscribe(&self, other: &Events, event: String, callback: Callback, once: bool) {
        let count = {
            let mut index = lock(&other.inner.listener_index);
            let records = index.entry(event.clone()).or_default();
            records.push(ListenerRecord::new(self, once));
            records.len()
        };
        other.warn_if_crowded(&event, count);

        lock(&self.inner.listener_callbacks).insert(event.clone(), ListenerSlot { callback });
        {
            let mut sources = lock(&self.inner.sources);
            sources.retain(|source| source.strong_count() > 0);
            let target = Arc::as_ptr(&other.inner);
            if !sources.iter().any(|source| std::ptr::eq(source.as_ptr(), target)) {
                sources.push(Arc::downgrade(&other.inner));
            }
        }
        log::trace!(
            "{} listens to '{event}' on {}{}.",
            self.id(),
            other.id(),
            if once { " once" } else { "" }
        );
    }

    fn warn_if_crowded(&self, event: &str, count: usize) {
        let Some(threshold) = self.config().listener_warning_threshold else {
            return;
        };
        if count > threshold && lock(&self.inner.warned).insert(event.to_string()) {
            log::warn!(
                "{} ({}) has {count} listeners for '{event}', above the threshold of {threshold}. Possible listener leak.",
                self.id(),
                self.config().label.as_deref().unwrap_or("unlabeled"),
            );
        }
    }

    /// Removes subscriptions held by this emitter. Absent records are ignored.
    pub fn stop_listening(&self, which: StopListening<'_>) {
        match which {
            StopListening::All => {
                lock(&self.inner.listener_callbacks).clear();
                let sources = std::mem::take(&mut *lock(&self.inner.sources));
                for source in sources.iter().filter_map(|source| source.upgrade()) {
                    self.drop_records_on(&Events::from_inner(source));
                }
                log::debug!(
                    "{} stopped listening to {} source(s).",
                    self.id(),
                    sources.len()
                );
            }
            StopListening::Source(other) => {
                self.drop_records_on(other);
                let target = Arc::as_ptr(&other.inner);
                lock(&self.inner.sources).retain(|source| !std::ptr::eq(source.as_ptr(), target));
                log::debug!("{} stopped listening to {}.", self.id(), other.id());
            }
            StopListening::SourceAndEvent(other, event) => {
                {
                    let mut index = lock(&other.inner.listener_index);
                    if let Some(records) = index.get_mut(event) {
                        // When subscribed several times, the last record goes first.
                        if let Some(position) = records.iter().rposition(|r| r.is_from(self)) {
                            records.remove(position);
                        }
                    }
                }
                lock(&self.inner.listener_callbacks).remove(event);
                log::debug!("{} stopped listening to '{event}' on {}.", self.id(), other.id());
            }
        }
    }

    fn drop_records_on(&self, source: &Events) {
        let mut index = lock(&source.inner.listener_index);
        for records in index.values_mut() {
            records.retain(|record| !record.is_from(self));
        }
    }

    /// Returns the event names this emitter holds a listener callback for, sorted.
    pub fn listening_events(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.inner.listener_callbacks)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
