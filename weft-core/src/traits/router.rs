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

use crate::common::UnitId;
use crate::message::{Message, MessageMeta};
use crate::routing::RoutingError;

/// What a router wants done with a message on the server side of a component,
/// i.e. towards its connected clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFanout {
    /// Nothing to send to clients.
    None,
    /// Send to the single client matching the given identifier.
    Direct(UnitId),
    /// Send to every connected client except those in the skip list.
    Broadcast {
        /// Clients excluded from the broadcast, matched with the instance
        /// wildcard rule. Used to avoid echoing a message back to the client
        /// it came from.
        skip: Vec<UnitId>,
    },
}

/// Routing strategy of a component.
///
/// One router exists per process, selected by the component's role at
/// startup. For every message entering `dispatch`, the bus consults the
/// router in this order: [`verify`](MessageRouter::verify) (drop on error),
/// [`dispatch_locally`](MessageRouter::dispatch_locally),
/// [`forward_to_server`](MessageRouter::forward_to_server) and
/// [`client_fanout`](MessageRouter::client_fanout). Local dispatch and remote
/// forwarding are logically concurrent; no ordering between their effects is
/// guaranteed.
pub trait MessageRouter: Send + Sync {
    /// Checks the legality of a message given how it entered the process.
    ///
    /// Rejects protected messages without a matching API key, local-channel
    /// messages injected from remote entrypoints, locally emitted direct
    /// messages addressed to the component itself, and (for non-relaying
    /// roles) incoming direct messages addressed elsewhere.
    fn verify(&self, msg: &Message, meta: &MessageMeta) -> Result<(), RoutingError>;

    /// Whether the message must be dispatched to this component's own
    /// services.
    fn dispatch_locally(&self, msg: &Message, meta: &MessageMeta) -> bool;

    /// Whether the message must be pushed out through the client-side
    /// connection towards this component's server.
    fn forward_to_server(&self, msg: &Message, meta: &MessageMeta) -> bool;

    /// What, if anything, must be sent to this component's connected clients.
    fn client_fanout(&self, msg: &Message, meta: &MessageMeta) -> ClientFanout;
}
