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

//! An in-process transport built on bounded channels.
//!
//! Frames still pass through the full wire serialization, so two components
//! joined by a memory link exchange exactly the bytes they would exchange
//! over a socket. Used by single-process topologies and the integration
//! tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::common::UnitId;
use crate::message::Entrypoint;
use crate::service::Component;
use crate::traits::TransportLink;
use crate::transport::{
    ClientConnectedEvent, ClientDisconnectedEvent, ServerConnectedEvent, ServerDisconnectedEvent,
    TransportError, WireMessage,
};

/// One direction of an in-process connection: a bounded queue towards the
/// peer.
#[derive(Debug)]
pub struct MemoryLink {
    peer: UnitId,
    tx: mpsc::Sender<WireMessage>,
}

impl MemoryLink {
    /// Wraps a channel sender as a link towards `peer`.
    #[must_use]
    pub fn new(peer: UnitId, tx: mpsc::Sender<WireMessage>) -> Self {
        Self { peer, tx }
    }
}

#[async_trait]
impl TransportLink for MemoryLink {
    fn peer(&self) -> Option<UnitId> {
        Some(self.peer.clone())
    }

    async fn send(&self, frame: WireMessage) -> Result<(), TransportError> {
        // Bounded hand-off: fail fast under backpressure rather than block
        // the dispatching task.
        self.tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TransportError::Busy,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Connects two components in-process: `client` gains `server` as its
/// upstream, `server` gains `client` as one of its clients.
///
/// Each side spawns a receive loop bound to its bus's shutdown token and
/// announces the attachment with the corresponding local connection event.
/// Dropping either component's bus (via shutdown) tears the connection down
/// and emits the disconnection events.
pub async fn connect(server: &Component, client: &Component) {
    let (to_server_tx, to_server_rx) =
        mpsc::channel::<WireMessage>(server.config().network.channel_capacity);
    let (to_client_tx, to_client_rx) =
        mpsc::channel::<WireMessage>(client.config().network.channel_capacity);

    info!(server = %server.id(), client = %client.id(), "attaching in-process link");

    // Server side: register the client link and pump its inbound frames.
    server
        .bus()
        .network()
        .add_client(client.id().clone(), Arc::new(MemoryLink::new(client.id().clone(), to_client_tx)));
    spawn_server_side(server, client.id().clone(), to_server_rx);

    // Client side: register the upstream link and pump its inbound frames.
    client
        .bus()
        .network()
        .set_upstream(Arc::new(MemoryLink::new(server.id().clone(), to_server_tx)));
    spawn_client_side(client, server.id().clone(), to_client_rx);

    server
        .emitter()
        .event(ClientConnectedEvent {
            client: client.id().clone(),
        })
        .emit()
        .await;
    client
        .emitter()
        .event(ServerConnectedEvent {
            server: server.id().clone(),
        })
        .emit()
        .await;
}

fn spawn_server_side(server: &Component, peer: UnitId, mut rx: mpsc::Receiver<WireMessage>) {
    let bus = server.bus().clone();
    let emitter = server.emitter();
    let shutdown = bus.shutdown_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => bus.dispatch_wire(frame, Entrypoint::Server).await,
                    None => break,
                },
            }
        }
        debug!(client = %peer, "client link closed");
        bus.network().remove_client(&peer);
        emitter
            .event(ClientDisconnectedEvent { client: peer })
            .emit()
            .await;
    });
}

fn spawn_client_side(client: &Component, peer: UnitId, mut rx: mpsc::Receiver<WireMessage>) {
    let bus = client.bus().clone();
    let emitter = client.emitter();
    let shutdown = bus.shutdown_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => bus.dispatch_wire(frame, Entrypoint::Client).await,
                    None => break,
                },
            }
        }
        debug!(server = %peer, "upstream link closed");
        bus.network().clear_upstream();
        emitter
            .event(ServerDisconnectedEvent { server: peer })
            .emit()
            .await;
    });
}
