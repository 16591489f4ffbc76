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

//! Built-in events emitted locally when transport connections come and go.
//!
//! Subscribe to them like any other event, e.g. with a wildcard handler over
//! `event/network/*`.

use serde::{Deserialize, Serialize};

use crate::common::UnitId;
use crate::message::{MessageTypeRegistry, RegistryError};
use crate::traits::{MessageFamily, TypedPayload};

/// A client attached to this component's server side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConnectedEvent {
    /// The identity of the connected client.
    pub client: UnitId,
}

impl TypedPayload for ClientConnectedEvent {
    const NAME: &'static str = "event/network/client-connected";
    const FAMILY: MessageFamily = MessageFamily::Event;
}

/// A client detached from this component's server side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientDisconnectedEvent {
    /// The identity of the disconnected client.
    pub client: UnitId,
}

impl TypedPayload for ClientDisconnectedEvent {
    const NAME: &'static str = "event/network/client-disconnected";
    const FAMILY: MessageFamily = MessageFamily::Event;
}

/// This component's client side connected to its upstream server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConnectedEvent {
    /// The identity of the server, when known at connect time.
    pub server: UnitId,
}

impl TypedPayload for ServerConnectedEvent {
    const NAME: &'static str = "event/network/server-connected";
    const FAMILY: MessageFamily = MessageFamily::Event;
}

/// This component's client side lost its upstream server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerDisconnectedEvent {
    /// The identity of the lost server.
    pub server: UnitId,
}

impl TypedPayload for ServerDisconnectedEvent {
    const NAME: &'static str = "event/network/server-disconnected";
    const FAMILY: MessageFamily = MessageFamily::Event;
}

/// A connection misbehaved: an inbound frame could not be decoded, or a
/// link failed in a way that is not a plain disconnect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionErrorEvent {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl TypedPayload for ConnectionErrorEvent {
    const NAME: &'static str = "event/network/error";
    const FAMILY: MessageFamily = MessageFamily::Event;
}

/// Registers the built-in network events; called once per component at
/// startup.
///
/// # Errors
///
/// Fails only when one of the names is already bound to a foreign type,
/// which indicates an application type squatting on the `event/network`
/// namespace.
pub fn register_core_message_types(registry: &MessageTypeRegistry) -> Result<(), RegistryError> {
    registry.register::<ClientConnectedEvent>()?;
    registry.register::<ClientDisconnectedEvent>()?;
    registry.register::<ServerConnectedEvent>()?;
    registry.register::<ServerDisconnectedEvent>()?;
    registry.register::<ConnectionErrorEvent>()?;
    Ok(())
}
