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

/// Router for the central server component.
///
/// A hub runs only a server side and acts as the relay between its connected
/// clients: non-local messages received from one client are re-sent to all
/// other clients except the original sender, and direct messages addressed
/// to another component are passed through to that client.
#[derive(Debug)]
pub struct HubRouter {
    core: RouterCore,
}

impl HubRouter {
    /// Creates a hub router for the component with the given identity and
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

impl MessageRouter for HubRouter {
    fn verify(&self, msg: &Message, meta: &MessageMeta) -> Result<(), RoutingError> {
        // Direct messages for other components are legal here: relaying them
        // is the hub's job.
        self.core.verify(msg, meta, true)
    }

    fn dispatch_locally(&self, msg: &Message, _meta: &MessageMeta) -> bool {
        self.core.dispatch_locally(msg)
    }

    fn forward_to_server(&self, _msg: &Message, _meta: &MessageMeta) -> bool {
        // A hub has no upstream connection.
        false
    }

    fn client_fanout(&self, msg: &Message, meta: &MessageMeta) -> ClientFanout {
        match meta.entrypoint() {
            Entrypoint::Local => self.relay_fanout(msg, false),
            // Re-send what one client gave us to all the others, never back
            // to the one it came from.
            Entrypoint::Server => self.relay_fanout(msg, true),
            Entrypoint::Client => ClientFanout::None,
        }
    }
}
