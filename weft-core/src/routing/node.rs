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
use crate::message::{Channel, Entrypoint, Message, MessageMeta};
use crate::routing::{RouterCore, RoutingError};
use crate::traits::{ClientFanout, MessageRouter};

/// Router for intermediary components (e.g. the gate) that run both a
/// client side towards an upstream server and a server side for their own
/// clients.
///
/// A node relays in both directions: traffic from its clients also goes
/// upstream, traffic from upstream also goes down to its clients, and in
/// either case the side a message came in on is never echoed back to.
#[derive(Debug)]
pub struct NodeRouter {
    core: RouterCore,
}

impl NodeRouter {
    /// Creates a node router for the component with the given identity and
    /// configured API key.
    #[must_use]
    pub fn new(own_id: UnitId, api_key: String) -> Self {
        Self {
            core: RouterCore::new(own_id, api_key),
        }
    }

    fn relay_fanout(&self, msg: &Message, skip_sender: bool) -> ClientFanout {
        match msg.target() {
            Channel::Local => ClientFanout::None,
            Channel::Direct { target } => {
                if target.matches(self.core.own_id()) {
                    ClientFanout::None
                } else {
                    ClientFanout::Direct(target.clone())
                }
            }
            Channel::Global | Channel::Room { .. } => ClientFanout::Broadcast {
                skip: if skip_sender {
                    vec![msg.sender().clone()]
                } else {
                    Vec::new()
                },
            },
        }
    }
}

impl MessageRouter for NodeRouter {
    fn verify(&self, msg: &Message, meta: &MessageMeta) -> Result<(), RoutingError> {
        self.core.verify(msg, meta, true)
    }

    fn dispatch_locally(&self, msg: &Message, _meta: &MessageMeta) -> bool {
        self.core.dispatch_locally(msg)
    }

    fn forward_to_server(&self, msg: &Message, meta: &MessageMeta) -> bool {
        match msg.target() {
            Channel::Local => return false,
            // A direct message terminating at this node goes no further.
            Channel::Direct { target } if target.matches(self.core.own_id()) => return false,
            _ => {}
        }
        // Locally originated traffic and traffic from our own clients both
        // continue upstream; what came from upstream must not bounce back.
        matches!(meta.entrypoint(), Entrypoint::Local | Entrypoint::Server)
    }

    fn client_fanout(&self, msg: &Message, meta: &MessageMeta) -> ClientFanout {
        match meta.entrypoint() {
            Entrypoint::Local | Entrypoint::Client => self.relay_fanout(msg, false),
            Entrypoint::Server => self.relay_fanout(msg, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::*;
    use crate::message::MessageKind;
    use crate::traits::{MessageFamily, TypedPayload};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Probe;

    impl TypedPayload for Probe {
        const NAME: &'static str = "event/test/probe";
        const FAMILY: MessageFamily = MessageFamily::Event;
    }

    fn node_id() -> UnitId {
        UnitId::new("infra", "gate")
    }

    fn broadcast_from(sender: UnitId) -> Message {
        Message::assemble(
            sender.clone(),
            sender.clone(),
            Channel::global(),
            vec![sender],
            Uuid::new_v4(),
            MessageKind::Event,
            Arc::new(Probe),
            HashMap::new(),
            None,
        )
    }

    #[test]
    fn client_traffic_continues_upstream_and_to_siblings() {
        let router = NodeRouter::new(node_id(), String::new());
        let sender = UnitId::with_instance("web", "frontend", "1");
        let msg = broadcast_from(sender.clone());
        let meta = MessageMeta::remote(Entrypoint::Server);
        assert!(router.forward_to_server(&msg, &meta));
        assert_eq!(
            router.client_fanout(&msg, &meta),
            ClientFanout::Broadcast {
                skip: vec![sender]
            }
        );
    }

    #[test]
    fn direct_traffic_terminating_here_stops_here() {
        let router = NodeRouter::new(node_id(), String::new());
        let sender = UnitId::with_instance("web", "frontend", "1");
        let msg = Message::assemble(
            sender.clone(),
            sender.clone(),
            Channel::direct(node_id()),
            vec![sender],
            Uuid::new_v4(),
            MessageKind::Event,
            Arc::new(Probe),
            HashMap::new(),
            None,
        );
        let meta = MessageMeta::remote(Entrypoint::Server);
        assert!(router.dispatch_locally(&msg, &meta));
        assert!(!router.forward_to_server(&msg, &meta));
        assert_eq!(router.client_fanout(&msg, &meta), ClientFanout::None);
    }

    #[test]
    fn upstream_traffic_goes_down_but_never_back_up() {
        let router = NodeRouter::new(node_id(), String::new());
        let msg = broadcast_from(UnitId::new("infra", "server"));
        let meta = MessageMeta::remote(Entrypoint::Client);
        assert!(!router.forward_to_server(&msg, &meta));
        assert_eq!(
            router.client_fanout(&msg, &meta),
            ClientFanout::Broadcast { skip: Vec::new() }
        );
    }
}
