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
use crate::routing::{RouterCore, RoutingError};
use crate::traits::{ClientFanout, MessageRouter};

/// Router for pure client components (connectors, web frontends).
///
/// A leaf owns a single client-side connection to its server and never runs
/// a server side: locally originated non-local messages go upstream,
/// nothing is ever fanned out to clients.
#[derive(Debug)]
pub struct LeafRouter {
    core: RouterCore,
}

impl LeafRouter {
    /// Creates a leaf router for the component with the given identity and
    /// configured API key.
    #[must_use]
    pub fn new(own_id: UnitId, api_key: String) -> Self {
        Self {
            core: RouterCore::new(own_id, api_key),
        }
    }
}

impl MessageRouter for LeafRouter {
    fn verify(&self, msg: &Message, meta: &MessageMeta) -> Result<(), RoutingError> {
        self.core.verify(msg, meta, false)
    }

    fn dispatch_locally(&self, msg: &Message, _meta: &MessageMeta) -> bool {
        self.core.dispatch_locally(msg)
    }

    fn forward_to_server(&self, msg: &Message, meta: &MessageMeta) -> bool {
        !msg.target().is_local() && RouterCore::originated_here(meta)
    }

    fn client_fanout(&self, _msg: &Message, _meta: &MessageMeta) -> ClientFanout {
        ClientFanout::None
    }
}
