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

//! The [`Events`] emitter: own bindings and dispatch.
//!
//! Each emitter owns three tables:
//!
//! - **own bindings**: event name -> the single callback bound with
//!   [`Events::on`] or [`Events::once`]. Binding again on a name replaces the
//!   previous binding.
//! - **listener index**: event name -> ordered records of the emitters that
//!   [listen to](Events::listen_to) this one.
//! - **listener callbacks**: event name -> the single callback this emitter
//!   runs when any source it listens to raises that event.
//!
//! No lock is held while a callback runs, so callbacks may bind, unbind and
//! (un)subscribe on any emitter, including the one being dispatched.

use crate::callback::{Callback, Context};
use crate::config::EventsConfig;
use crate::error::EventError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use uuid::Uuid;

/// A unique identifier for an emitter, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(Uuid);

impl EmitterId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emitter {}", self.0)
    }
}

/// Selects which own bindings [`Events::off`] removes.
#[derive(Debug, Clone, Copy)]
pub enum Unbind<'a> {
    /// Remove every own binding.
    Clear,
    /// Remove the binding for one event name.
    Event(&'a str),
    /// Remove every binding whose callback is this callback.
    Callback(&'a Callback),
    /// Remove the binding for the event name. The callback is not compared,
    /// since a name holds at most one binding.
    EventAndCallback(&'a str, &'a Callback),
}

/// Tokens tell a binding or listener record apart from a later one that
/// replaced it while its callback was running.
fn next_token() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub(crate) struct Binding {
    callback: Callback,
    context: Option<Context>,
    once: bool,
    token: u64,
}

#[derive(Clone)]
pub(crate) struct ListenerRecord {
    listener: Weak<Inner>,
    once: bool,
    token: u64,
}

impl ListenerRecord {
    pub(crate) fn new(listener: &Events, once: bool) -> Self {
        Self {
            listener: Arc::downgrade(&listener.inner),
            once,
            token: next_token(),
        }
    }

    pub(crate) fn is_from(&self, listener: &Events) -> bool {
        std::ptr::eq(self.listener.as_ptr(), Arc::as_ptr(&listener.inner))
    }
}

/// The callback a listening emitter runs for one event name.
#[derive(Clone)]
pub(crate) struct ListenerSlot {
    pub(crate) callback: Callback,
}

pub(crate) struct Inner {
    id: EmitterId,
    config: EventsConfig,
    pub(crate) own_bindings: Mutex<HashMap<String, Binding>>,
    pub(crate) listener_index: Mutex<HashMap<String, Vec<ListenerRecord>>>,
    pub(crate) listener_callbacks: Mutex<HashMap<String, ListenerSlot>>,
    /// Event names that already produced a listener-count warning.
    pub(crate) warned: Mutex<HashSet<String>>,
    /// Emitters this one holds listener records on.
    pub(crate) sources: Mutex<Vec<Weak<Inner>>>,
}

/// The publish/subscribe capability.
///
/// An `Events` value is a handle: clones share the same tables and compare
/// equal with [`same_emitter`](Events::same_emitter). Hosts gain the
/// capability by holding one (see [`Evented`](crate::Evented)) or by being
/// wrapped with [`extends`](Events::extends).
///
/// # Example
///
/// ```rust
/// use herald_core::{Callback, Events};
/// use serde_json::json;
/// use std::sync::{Arc, Mutex};
///
/// let model = Events::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = seen.clone();
/// model.on("change", Callback::new(move |_, args| {
///     sink.lock().unwrap().extend_from_slice(args);
///     Ok(())
/// }));
///
/// model.trigger("change", &[json!("title"), json!(3)]).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![json!("title"), json!(3)]);
/// ```
#[derive(Clone)]
pub struct Events {
    pub(crate) inner: Arc<Inner>,
}

impl Events {
    /// Creates an emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EventsConfig::default())
    }

    /// Creates an emitter with the given configuration.
    pub fn with_config(config: EventsConfig) -> Self {
        let events = Self {
            inner: Arc::new(Inner {
                id: EmitterId::new(),
                config,
                own_bindings: Mutex::new(HashMap::new()),
                listener_index: Mutex::new(HashMap::new()),
                listener_callbacks: Mutex::new(HashMap::new()),
                warned: Mutex::new(HashSet::new()),
                sources: Mutex::new(Vec::new()),
            }),
        };
        match &events.inner.config.label {
            Some(label) => log::info!("Events capability '{label}' initialized ({}).", events.id()),
            None => log::trace!("Events capability initialized ({}).", events.id()),
        }
        events
    }

    /// Returns this emitter's identifier.
    pub fn id(&self) -> EmitterId {
        self.inner.id
    }

    /// Returns this emitter's configuration.
    pub fn config(&self) -> &EventsConfig {
        &self.inner.config
    }

    /// Returns `true` if both handles refer to the same emitter.
    pub fn same_emitter(&self, other: &Events) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Binds `callback` to `event`, replacing any binding for that name.
    ///
    /// The callback runs against this emitter.
    pub fn on(&self, event: impl Into<String>, callback: Callback) {
        self.insert_binding(event.into(), callback, None, false);
    }

    /// Binds `callback` to `event`, running it against `context`.
    pub fn on_with_context(&self, event: impl Into<String>, callback: Callback, context: Context) {
        self.insert_binding(event.into(), callback, Some(context), false);
    }

    /// Alias of [`on`](Events::on).
    pub fn bind(&self, event: impl Into<String>, callback: Callback) {
        self.on(event, callback);
    }

    /// Binds `callback` to `event` for a single invocation.
    ///
    /// The binding is removed right after the next `trigger` of `event` runs it.
    /// It is still in place while the callback runs: a callback that triggers
    /// `event` on the same emitter again recurses without bound.
    pub fn once(&self, event: impl Into<String>, callback: Callback) {
        self.insert_binding(event.into(), callback, None, true);
    }

    /// Like [`once`](Events::once), running the callback against `context`.
    pub fn once_with_context(
        &self,
        event: impl Into<String>,
        callback: Callback,
        context: Context,
    ) {
        self.insert_binding(event.into(), callback, Some(context), true);
    }

    fn insert_binding(
        &self,
        event: String,
        callback: Callback,
        context: Option<Context>,
        once: bool,
    ) {
        let binding = Binding {
            callback,
            context,
            once,
            token: next_token(),
        };
        if lock(&self.inner.own_bindings)
            .insert(event.clone(), binding)
            .is_some()
        {
            log::trace!("{} replaced its binding for '{event}'.", self.id());
        }
    }

    /// Removes own bindings. Absent names are ignored.
    pub fn off(&self, which: Unbind<'_>) {
        let mut bindings = lock(&self.inner.own_bindings);
        match which {
            Unbind::Clear => bindings.clear(),
            Unbind::Event(event) | Unbind::EventAndCallback(event, _) => {
                bindings.remove(event);
            }
            Unbind::Callback(callback) => {
                bindings.retain(|_, binding| !binding.callback.same_as(callback));
            }
        }
    }

    /// Alias of [`off`](Events::off).
    pub fn unbind(&self, which: Unbind<'_>) {
        self.off(which);
    }

    /// Raises `event`, invoking every handler registered for it with `args`.
    ///
    /// The own binding runs first, then the callbacks of listening emitters in
    /// subscription order. Once-bindings and once-listeners are dropped after
    /// they ran. The first callback error stops the dispatch and is returned;
    /// in that case no once-listener of this call is dropped.
    pub fn trigger(&self, event: &str, args: &[Value]) -> Result<(), EventError> {
        if self.inner.config.trace_dispatch {
            log::trace!("{} triggering '{event}' with {} argument(s).", self.id(), args.len());
        }

        let own = lock(&self.inner.own_bindings).get(event).cloned();
        if let Some(binding) = own {
            let context = binding
                .context
                .clone()
                .unwrap_or_else(|| Context::Emitter(self.clone()));
            binding
                .callback
                .invoke(&context, args)
                .map_err(|source| self.handler_error(event, source))?;
            if binding.once {
                let mut bindings = lock(&self.inner.own_bindings);
                // The callback may have rebound the name; keep the newer binding.
                if bindings
                    .get(event)
                    .is_some_and(|current| current.token == binding.token)
                {
                    bindings.remove(event);
                }
            }
        }

        let records = match lock(&self.inner.listener_index).get(event) {
            Some(records) if !records.is_empty() => records.clone(),
            _ => return Ok(()),
        };

        let mut spent = Vec::new();
        for record in &records {
            let Some(inner) = record.listener.upgrade() else {
                spent.push(record.token);
                continue;
            };
            let listener = Events::from_inner(inner);
            let callback = lock(&listener.inner.listener_callbacks)
                .get(event)
                .map(|slot| slot.callback.clone())
                .unwrap_or_else(Callback::noop);
            callback
                .invoke(&Context::Emitter(listener), args)
                .map_err(|source| self.handler_error(event, source))?;
            if record.once {
                spent.push(record.token);
            }
        }

        if !spent.is_empty() {
            // Rebuild from the live list so records added during dispatch survive.
            if let Some(current) = lock(&self.inner.listener_index).get_mut(event) {
                current.retain(|record| !spent.contains(&record.token));
            }
        }
        Ok(())
    }

    fn handler_error(&self, event: &str, source: anyhow::Error) -> EventError {
        log::debug!("{} aborted dispatch of '{event}': {source}", self.id());
        EventError::Handler {
            event: event.to_string(),
            emitter: self.id(),
            source,
        }
    }

    /// Returns `true` if an own binding exists for `event`.
    pub fn has_binding(&self, event: &str) -> bool {
        lock(&self.inner.own_bindings).contains_key(event)
    }

    /// Returns the names with an own binding, sorted.
    pub fn bound_events(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.inner.own_bindings).keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of listener records registered on this emitter for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.inner.listener_index).get(event).map_or(0, Vec::len)
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("id", &self.inner.id)
            .field("label", &self.inner.config.label)
            .finish_non_exhaustive()
    }
}
