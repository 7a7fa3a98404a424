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

//! # Herald Core
//!
//! A publish/subscribe capability that can be attached to any host type by
//! composition.
//!
//! An [`Events`] emitter can bind one callback per event name to itself
//! ([`Events::on`], [`Events::once`]), listen to events raised by other
//! emitters ([`Events::listen_to`]), and tear either down again
//! ([`Events::off`], [`Events::stop_listening`]). [`Events::trigger`]
//! dispatches synchronously: the own binding first, then listeners in
//! subscription order.
//!
//! Hosts pick up the whole operation set through the [`Evented`] trait,
//! derivable with `#[derive(Evented)]`, or by wrapping a value with
//! [`extends`].

#![warn(missing_docs)]

// Lets `#[derive(Evented)]` expand to `::herald_core` paths inside this crate too.
extern crate self as herald_core;

pub mod callback;
pub mod config;
pub mod emitter;
pub mod error;
pub mod listen;
pub mod mixin;

pub use callback::{Callback, Context, HandlerResult};
pub use config::EventsConfig;
pub use emitter::{EmitterId, Events, Unbind};
pub use error::EventError;
pub use listen::StopListening;
pub use mixin::{extends, Evented, Extended};

/// Derives [`Evented`] for a struct holding an [`Events`] field.
///
/// The field is the one marked `#[events]`, or else the only field whose
/// type is named `Events`.
pub use herald_macros::Evented;

/// The argument value type handed to callbacks.
pub use serde_json::Value;
