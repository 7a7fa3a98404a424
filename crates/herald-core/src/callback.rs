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

//! Callback and context types handed to the dispatcher.

use crate::emitter::Events;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The result returned by every callback.
///
/// An `Err` aborts the remaining invocations of the current `trigger` call.
pub type HandlerResult = anyhow::Result<()>;

type HandlerFn = dyn Fn(&Context, &[Value]) -> HandlerResult + Send + Sync;

/// A shareable event callback.
///
/// Callbacks compare by identity: two clones of the same `Callback` are equal,
/// two callbacks built from identical closures are not. This is what
/// [`Unbind::Callback`](crate::Unbind::Callback) matches on.
#[derive(Clone)]
pub struct Callback(Arc<HandlerFn>);

impl Callback {
    /// Wraps a closure receiving the resolved context and the argument vector.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, &[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Returns the shared callback that does nothing.
    ///
    /// Used wherever a callback cannot be resolved, e.g. a listener whose
    /// slot was removed. The same instance is returned on every call.
    pub fn noop() -> Self {
        static NOOP: OnceLock<Callback> = OnceLock::new();
        NOOP.get_or_init(|| Callback::new(noop)).clone()
    }

    /// Invokes the callback.
    pub fn invoke(&self, context: &Context, args: &[Value]) -> HandlerResult {
        (self.0)(context, args)
    }

    /// Returns `true` if both values are clones of the same callback.
    pub fn same_as(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// The function behind [`Callback::noop`].
pub fn noop(_context: &Context, _args: &[Value]) -> HandlerResult {
    Ok(())
}

/// The receiver a callback runs against.
///
/// Own bindings default to the emitter that raised the event; listener
/// callbacks always run against the listening emitter.
#[derive(Clone)]
pub enum Context {
    /// An emitter, usually the one that owns the callback.
    Emitter(Events),
    /// An arbitrary user value supplied at bind time.
    Value(Arc<dyn Any + Send + Sync>),
}

impl Context {
    /// Wraps a user value as a context.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Context::Value(Arc::new(value))
    }

    /// Returns the emitter if this context is one.
    pub fn emitter(&self) -> Option<&Events> {
        match self {
            Context::Emitter(events) => Some(events),
            Context::Value(_) => None,
        }
    }

    /// Returns the user value if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Context::Value(value) => value.downcast_ref::<T>(),
            Context::Emitter(_) => None,
        }
    }
}

impl From<Events> for Context {
    fn from(events: Events) -> Self {
        Context::Emitter(events)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Emitter(events) => f.debug_tuple("Emitter").field(events).finish(),
            Context::Value(_) => f.write_str("Value(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_are_the_same_callback() {
        let cb = Callback::new(|_, _| Ok(()));
        let other = Callback::new(|_, _| Ok(()));
        assert_eq!(cb, cb.clone());
        assert_ne!(cb, other);
    }

    #[test]
    fn noop_is_a_single_instance() {
        assert!(Callback::noop().same_as(&Callback::noop()));
        let ctx = Context::value(());
        assert!(Callback::noop().invoke(&ctx, &[json!(1)]).is_ok());
    }

    #[test]
    fn invoke_passes_arguments_through() {
        let cb = Callback::new(|_, args| {
            anyhow::ensure!(args == [json!("a"), json!(2)], "unexpected args {args:?}");
            Ok(())
        });
        cb.invoke(&Context::value(()), &[json!("a"), json!(2)])
            .unwrap();
        assert!(cb.invoke(&Context::value(()), &[]).is_err());
    }

    #[test]
    fn value_context_downcasts() {
        let ctx = Context::value(42u32);
        assert_eq!(ctx.downcast_ref::<u32>(), Some(&42));
        assert!(ctx.downcast_ref::<String>().is_none());
        assert!(ctx.emitter().is_none());
    }

    #[test]
    fn emitter_context() {
        let events = Events::new();
        let ctx = Context::from(events.clone());
        assert!(ctx.emitter().is_some_and(|e| e.same_emitter(&events)));
        assert!(ctx.downcast_ref::<u32>().is_none());
    }
}
