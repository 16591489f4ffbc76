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

//! The network side of the fabric: the wire format, the per-component
//! network layer holding live connections, the built-in connection events,
//! and an in-process transport for tests and single-process topologies.

mod events;
mod memory;
mod network;
mod wire;

pub use events::{
    register_core_message_types, ClientConnectedEvent, ClientDisconnectedEvent,
    ConnectionErrorEvent, ServerConnectedEvent, ServerDisconnectedEvent,
};
pub use memory::{connect, MemoryLink};
pub use network::{NetworkLayer, TransportError};
pub use wire::WireMessage;
