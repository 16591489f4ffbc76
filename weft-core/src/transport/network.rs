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

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::common::UnitId;
use crate::message::Message;
use crate::traits::TransportLink;
use crate::transport::WireMessage;

/// Errors raised by transport links.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection is gone; the link should be discarded.
    #[error("connection closed")]
    Closed,
    /// The send queue is full. The frame is dropped, not queued.
    #[error("send queue full")]
    Busy,
    /// The message could not be serialized for the wire.
    #[error("failed to encode message {name:?}: {detail}")]
    Encode {
        /// The message name.
        name: String,
        /// The underlying serialization failure.
        detail: String,
    },
}

/// The live connections of one component: at most one upstream link towards
/// a server, and any number of client links keyed by the peer's identity.
///
/// All send operations are fire-and-forget from the bus's point of view:
/// a failing link is logged and the dispatch proceeds. Links come and go at
/// runtime as transports attach and detach.
#[derive(Default)]
pub struct NetworkLayer {
    upstream: RwLock<Option<Arc<dyn TransportLink>>>,
    clients: DashMap<String, Arc<dyn TransportLink>>,
}

impl std::fmt::Debug for NetworkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkLayer")
            .field("has_upstream", &self.upstream.read().is_some())
            .field("clients", &self.clients.len())
            .finish()
    }
}

impl NetworkLayer {
    /// Creates a network layer with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the upstream link, replacing any previous one.
    pub fn set_upstream(&self, link: Arc<dyn TransportLink>) {
        debug!(peer = ?link.peer(), "upstream link attached");
        *self.upstream.write() = Some(link);
    }

    /// Detaches the upstream link.
    pub fn clear_upstream(&self) {
        debug!("upstream link detached");
        *self.upstream.write() = None;
    }

    /// Attaches a client link under the given peer identity.
    pub fn add_client(&self, peer: UnitId, link: Arc<dyn TransportLink>) {
        debug!(%peer, "client link attached");
        self.clients.insert(peer.to_string(), link);
    }

    /// Detaches the client link for the given peer.
    pub fn remove_client(&self, peer: &UnitId) {
        debug!(%peer, "client link detached");
        self.clients.remove(&peer.to_string());
    }

    /// Whether an upstream link is attached.
    #[must_use]
    pub fn has_upstream(&self) -> bool {
        self.upstream.read().is_some()
    }

    /// Number of attached client links.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Pushes a message up the client side towards the server.
    pub async fn send_to_server(&self, msg: &Message) {
        let Some(link) = self.upstream.read().clone() else {
            debug!(name = msg.name(), "no upstream link, message not forwarded");
            return;
        };
        let Some(frame) = encode(msg) else { return };
        trace!(name = msg.name(), "forwarding to server");
        if let Err(err) = link.send(frame).await {
            warn!(name = msg.name(), error = %err, "failed to forward message to server");
        }
    }

    /// Pushes a message down to the one client matching `target`.
    pub async fn send_to_client(&self, target: &UnitId, msg: &Message) {
        let link = self.clients.iter().find_map(|entry| {
            entry
                .value()
                .peer()
                .filter(|peer| target.matches(peer))
                .map(|_| entry.value().clone())
        });
        let Some(link) = link else {
            debug!(name = msg.name(), %target, "no client link matches target");
            return;
        };
        let Some(frame) = encode(msg) else { return };
        trace!(name = msg.name(), %target, "forwarding to client");
        if let Err(err) = link.send(frame).await {
            warn!(name = msg.name(), %target, error = %err, "failed to forward message to client");
        }
    }

    /// Pushes a message down to every client except the ones in `skip`
    /// (typically the sender the message came in from).
    pub async fn broadcast_to_clients(&self, msg: &Message, skip: &[UnitId]) {
        let links: Vec<_> = self
            .clients
            .iter()
            .filter(|entry| {
                entry.value().peer().map_or(true, |peer| {
                    !skip.iter().any(|skipped| skipped.matches(&peer))
                })
            })
            .map(|entry| entry.value().clone())
            .collect();
        if links.is_empty() {
            return;
        }
        let Some(frame) = encode(msg) else { return };
        trace!(name = msg.name(), fanout = links.len(), "broadcasting to clients");
        for link in links {
            if let Err(err) = link.send(frame.clone()).await {
                warn!(name = msg.name(), peer = ?link.peer(), error = %err, "failed to broadcast message to client");
            }
        }
    }
}

fn encode(msg: &Message) -> Option<WireMessage> {
    match WireMessage::from_message(msg) {
        Ok(frame) => Some(frame),
        Err(err) => {
            warn!(name = msg.name(), error = %err, "message cannot be encoded for the wire");
            None
        }
    }
}
