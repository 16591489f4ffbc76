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

//! # Weft Core
//!
//! This crate provides the message fabric every component of the platform is
//! built on: a typed, routed message-passing kernel with commands
//! (request/reply with timeout tracking), replies, and fire-and-forget events.
//!
//! ## Key Concepts
//!
//! - **Messages**: Immutable envelopes carrying a hierarchical name, a typed
//!   payload, an origin/sender pair, a hop trail and a correlation trace id.
//! - **Channels**: Destination descriptors: local, global broadcast, direct
//!   to one component, or a named room.
//! - **Routing**: Role-specific strategies ([`routing::LeafRouter`],
//!   [`routing::NodeRouter`], [`routing::HubRouter`]) decide, for every
//!   message entering or leaving a process, whether it is dispatched locally,
//!   pushed to the network, or rejected.
//! - **Dispatch**: The [`dispatch::MessageBus`] matches messages against
//!   registered service handlers, tracks in-flight commands, and settles
//!   their replies or timeouts exactly once.
//! - **Services**: Named bundles of handler registrations; each handler runs
//!   inside a fresh [`dispatch::ServiceContext`].
//! - **Transport**: A thin adaptation layer ([`transport::NetworkLayer`])
//!   between the bus and whatever socket library carries the frames.

/// Shared building blocks: component identifiers and configuration.
pub mod common;

/// Message envelopes, channels, meta-information and the type registry.
pub mod message;

/// Routing strategies and routing errors.
pub mod routing;

/// The message bus, pending-command tracking, contexts and composers.
pub mod dispatch;

/// Services, handler registration and the component assembly.
pub mod service;

/// Wire format, network layer and transport links.
pub mod transport;

/// Core traits: payloads, routers and transport links.
pub mod traits;
