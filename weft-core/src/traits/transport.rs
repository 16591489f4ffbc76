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

use std::fmt::Debug;

use async_trait::async_trait;

use crate::common::UnitId;
use crate::transport::{TransportError, WireMessage};

/// One physical bidirectional connection to a remote peer.
///
/// The fabric does not prescribe the socket library; any implementation that
/// can queue a [`WireMessage`] towards its peer satisfies the contract. Two
/// invariants bind implementations:
///
/// - [`send`](TransportLink::send) must be a bounded hand-off: it may fail
///   fast under backpressure but must never block the dispatching caller
///   indefinitely. Concurrent writers to one link must be serialized.
/// - The receive side must hand every decoded frame to
///   [`MessageBus::dispatch_wire`](crate::dispatch::MessageBus::dispatch_wire)
///   with the entrypoint matching the physical side the bytes arrived on
///   (`Server` for a connection accepted from a client, `Client` for a
///   connection made to a server). Routing correctness depends entirely on an
///   accurate entrypoint tag.
#[async_trait]
pub trait TransportLink: Send + Sync + Debug {
    /// The component on the other side of the connection, when known.
    fn peer(&self) -> Option<UnitId>;

    /// Queues a frame for delivery to the peer.
    ///
    /// Fire-and-forget from the bus's perspective; delivery failures surface
    /// as connection events, never as dispatch errors.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Busy`] when the send queue is full and
    /// [`TransportError::Closed`] when the connection is gone.
    async fn send(&self, frame: WireMessage) -> Result<(), TransportError>;
}
