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

//! Attaching the capability to host types.
//!
//! A host gains the full operation set in one of two ways:
//!
//! - by holding an [`Events`] field and implementing [`Evented`], usually
//!   through `#[derive(Evented)]`;
//! - by being wrapped with [`Events::extends`] (or the free [`extends`]),
//!   which pairs any value with fresh tables without touching its type.
//!
//! Either way each host owns its own tables; nothing is shared between two
//! extended hosts.

use crate::callback::{Callback, Context};
use crate::emitter::{Events, Unbind};
use crate::error::EventError;
use crate::listen::StopListening;
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// A type that carries the Events capability.
///
/// Only [`events`](Evented::events) must be provided; every operation
/// forwards to it. Methods that involve another emitter accept any
/// `Evented` type, so hosts can listen to each other directly.
///
/// # Example
///
/// ```rust
/// use herald_core::{Callback, Events, Evented};
/// use serde_json::json;
///
/// #[derive(Default, Evented)]
/// struct TodoModel {
///     title: String,
///     events: Events,
/// }
///
/// #[derive(Default, Evented)]
/// struct TodoView {
///     events: Events,
/// }
///
/// let model = TodoModel::default();
/// let view = TodoView::default();
/// view.listen_to(&model, "change", Callback::new(|_, args| {
///     assert_eq!(args, [json!("title")]);
///     Ok(())
/// }));
/// model.trigger("change", &[json!("title")]).unwrap();
/// ```
pub trait Evented {
    /// Returns the emitter backing this host.
    fn events(&self) -> &Events;

    /// See [`Events::on`].
    fn on(&self, event: impl Into<String>, callback: Callback) {
        self.events().on(event, callback);
    }

    /// See [`Events::on_with_context`].
    fn on_with_context(&self, event: impl Into<String>, callback: Callback, context: Context) {
        self.events().on_with_context(event, callback, context);
    }

    /// See [`Events::bind`].
    fn bind(&self, event: impl Into<String>, callback: Callback) {
        self.events().bind(event, callback);
    }

    /// See [`Events::once`].
    fn once(&self, event: impl Into<String>, callback: Callback) {
        self.events().once(event, callback);
    }

    /// See [`Events::once_with_context`].
    fn once_with_context(&self, event: impl Into<String>, callback: Callback, context: Context) {
        self.events().once_with_context(event, callback, context);
    }

    /// See [`Events::off`].
    fn off(&self, which: Unbind<'_>) {
        self.events().off(which);
    }

    /// See [`Events::unbind`].
    fn unbind(&self, which: Unbind<'_>) {
        self.events().unbind(which);
    }

    /// See [`Events::trigger`].
    fn trigger(&self, event: &str, args: &[Value]) -> Result<(), EventError> {
        self.events().trigger(event, args)
    }

    /// See [`Events::listen_to`].
    fn listen_to<O: Evented + ?Sized>(&self, other: &O, event: impl Into<String>, callback: Callback) {
        self.events().listen_to(other.events(), event, callback);
    }

    /// See [`Events::listen_to_once`].
    fn listen_to_once<O: Evented + ?Sized>(
        &self,
        other: &O,
        event: impl Into<String>,
        callback: Callback,
    ) {
        self.events().listen_to_once(other.events(), event, callback);
    }

    /// See [`Events::stop_listening`].
    fn stop_listening(&self, which: StopListening<'_>) {
        self.events().stop_listening(which);
    }

    /// Stops listening to `event` on `other`. See [`StopListening::SourceAndEvent`].
    fn stop_listening_to<O: Evented + ?Sized>(&self, other: &O, event: &str) {
        self.events()
            .stop_listening(StopListening::SourceAndEvent(other.events(), event));
    }
}

impl Evented for Events {
    fn events(&self) -> &Events {
        self
    }
}

/// A host value paired with its own emitter.
///
/// Dereferences to the host, so its fields and methods stay reachable.
#[derive(Debug)]
pub struct Extended<T> {
    host: T,
    events: Events,
}

impl<T> Extended<T> {
    /// Returns the host value.
    pub fn host(&self) -> &T {
        &self.host
    }

    /// Splits the wrapper into the host and its emitter.
    pub fn into_parts(self) -> (T, Events) {
        (self.host, self.events)
    }

    /// Drops the capability and returns the host.
    pub fn into_inner(self) -> T {
        self.host
    }
}

impl<T> Evented for Extended<T> {
    fn events(&self) -> &Events {
        &self.events
    }
}

impl<T> Deref for Extended<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.host
    }
}

impl<T> DerefMut for Extended<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.host
    }
}

impl Events {
    /// Attaches the capability to `target`.
    ///
    /// The result has its own, empty tables and inherits this emitter's
    /// configuration. Bindings and listeners of `self` are not copied.
    pub fn extends<T>(&self, target: T) -> Extended<T> {
        let events = Events::with_config(self.config().clone());
        log::trace!("{} extended from {}.", events.id(), self.id());
        Extended {
            host: target,
            events,
        }
    }
}

/// Attaches the capability with the default configuration to `target`.
pub fn extends<T>(target: T) -> Extended<T> {
    Extended {
        host: target,
        events: Events::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventsConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(crate::Evented)]
    struct Model {
        #[events]
        bus: Events,
        name: &'static str,
    }

    #[derive(crate::Evented)]
    struct Wrapper(u8, Events);

    fn counter(hits: &Arc<AtomicUsize>) -> Callback {
        let hits = hits.clone();
        Callback::new(move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn extended_hosts_do_not_share_tables() {
        let source = Events::new();
        let first = source.extends(Point::default());
        let second = source.extends(Point { x: 1, y: 2 });
        let hits = Arc::new(AtomicUsize::new(0));

        first.on("move", counter(&hits));
        second.trigger("move", &[]).unwrap();
        source.trigger("move", &[]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        first.trigger("move", &[]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!first.events().same_emitter(second.events()));
    }

    #[test]
    fn extended_host_keeps_its_fields() {
        let mut point = extends(Point { x: 3, y: 4 });
        point.x += 1;
        assert_eq!(point.host(), &Point { x: 4, y: 4 });
        assert_eq!(point.y, 4);
        assert_eq!(point.into_inner(), Point { x: 4, y: 4 });
    }

    #[test]
    fn extends_inherits_configuration_only() {
        let source = Events::with_config(EventsConfig::default().with_label("source"));
        source.on("a", Callback::noop());
        let extended = source.extends(());

        assert_eq!(extended.events().config().label.as_deref(), Some("source"));
        assert!(!extended.events().has_binding("a"));
        let (_, events) = extended.into_parts();
        assert!(events.bound_events().is_empty());
    }

    #[test]
    fn extended_hosts_listen_to_each_other() {
        let model = extends(Point::default());
        let view = extends("view");
        let hits = Arc::new(AtomicUsize::new(0));

        view.listen_to(&model, "change", counter(&hits));
        model.trigger("change", &[json!(1)]).unwrap();
        view.stop_listening_to(&model, "change");
        model.trigger("change", &[json!(2)]).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn derived_hosts_use_their_events_field() {
        let model = Model {
            bus: Events::new(),
            name: "todo",
        };
        let wrapper = Wrapper(7, Events::new());
        let hits = Arc::new(AtomicUsize::new(0));

        wrapper.listen_to_once(&model, "saved", counter(&hits));
        model.once("saved", counter(&hits));
        model.trigger("saved", &[]).unwrap();
        model.trigger("saved", &[]).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(model.name, "todo");
        assert_eq!(wrapper.0, 7);
        assert!(model.events().same_emitter(&model.bus));
        assert!(wrapper.events().same_emitter(&wrapper.1));
    }

    #[test]
    fn once_with_context_fires_once_against_the_context() {
        let host = extends(Point::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        host.once_with_context(
            "save",
            Callback::new(move |ctx, args| {
                let target = ctx.downcast_ref::<&'static str>().copied();
                sink.lock().unwrap().push((target, args.to_vec()));
                Ok(())
            }),
            Context::value("store"),
        );

        host.trigger("save", &[json!(1)]).unwrap();
        host.trigger("save", &[json!(2)]).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(Some("store"), vec![json!(1)])]);
        assert!(!host.events().has_binding("save"));
    }

    #[test]
    fn trait_off_and_unbind_forward() {
        let host = extends(());
        let hits = Arc::new(AtomicUsize::new(0));
        let cb = counter(&hits);
        host.bind("a", cb.clone());
        host.on("b", cb.clone());

        host.unbind(Unbind::Event("a"));
        host.trigger("a", &[]).unwrap();
        host.trigger("b", &[]).unwrap();
        host.off(Unbind::Callback(&cb));
        host.trigger("b", &[]).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
