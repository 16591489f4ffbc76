/*
 * Copyright (c) 2025. The Weft Authors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Weft
//!
//! Weft is a typed, routed message-passing fabric for building distributed
//! components that exchange commands, command replies, and events, locally
//! within a process and across the network through a hub-and-spoke topology.
//!
//! ## Key Concepts
//!
//! - **Components**: A running fabric participant with an identity, a
//!   routing role (leaf, node or hub) and its own message bus.
//! - **Messages**: Immutable typed envelopes. Commands demand exactly one
//!   reply and are tracked until it arrives or a timeout fires; events are
//!   fire-and-forget.
//! - **Channels**: Where a message goes: the local process, every connected
//!   component, or directly to one component.
//! - **Services**: Named bundles of message handlers. Handlers receive the
//!   typed payload plus a per-invocation context for emitting follow-up
//!   messages and replies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! #[weft_message]
//! struct Ping {
//!     payload: String,
//! }
//!
//! impl TypedPayload for Ping {
//!     const NAME: &'static str = "command/test/ping";
//!     const FAMILY: MessageFamily = MessageFamily::Command;
//! }
//! ```

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `weft-macro`)
/// *   [`weft_macro::weft_message`]: Attribute macro for defining message payloads.
///
/// ## External Crates
/// *   [`async_trait::async_trait`](https://docs.rs/async-trait/latest/async_trait/attr.async_trait.html): The macro for defining async functions in traits.
///
/// ## Core Types
/// *   [`weft_core::service::Component`]: The fabric entry point.
/// *   [`weft_core::service::Service`]: A bundle of message handlers.
/// *   [`weft_core::dispatch::ServiceContext`]: Per-invocation handler context.
/// *   [`weft_core::message::Channel`]: Message destinations.
/// *   [`weft_core::common::UnitId`]: Component identities.
/// *   [`weft_core::traits::TypedPayload`]: The payload contract.
pub mod prelude {
    // Macros from weft-macro
    pub use weft_macro::weft_message;

    // External crate re-exports
    pub use async_trait::async_trait;

    // Core types
    pub use weft_core::common::{UnitId, WeftConfig};
    pub use weft_core::dispatch::{MessageBus, MessageEmitter, ServiceContext};
    pub use weft_core::message::{Channel, Entrypoint, FailKind, Message, MessageMeta};
    pub use weft_core::service::{Component, ComponentRole, Service};
    pub use weft_core::traits::{MessageFamily, MessagePayload, TypedPayload};
    pub use weft_core::transport::{
        connect, ClientConnectedEvent, ClientDisconnectedEvent, ConnectionErrorEvent,
        ServerConnectedEvent, ServerDisconnectedEvent,
    };
}

pub use weft_core::{common, dispatch, message, routing, service, traits, transport};
