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

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::UnitId;
use crate::message::Channel;
use crate::traits::{MessageFamily, MessagePayload};

/// The open key-value payload bag carried alongside the typed fields.
pub type PayloadBag = HashMap<String, serde_json::Value>;

/// Role-specific data discriminating the three message families.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum MessageKind {
    /// A command, paired with exactly one eventual reply through `unique`.
    Command {
        /// Correlation id pairing this command with its reply.
        unique: Uuid,
    },
    /// The reply to a command.
    CommandReply {
        /// The `unique` id copied from the command being answered.
        unique: Uuid,
        /// Whether the command succeeded.
        success: bool,
        /// Human-readable detail, mainly for failures.
        message: String,
    },
    /// A fire-and-forget event.
    Event,
}

impl MessageKind {
    /// The family this kind belongs to.
    #[must_use]
    pub const fn family(&self) -> MessageFamily {
        match self {
            Self::Command { .. } => MessageFamily::Command,
            Self::CommandReply { .. } => MessageFamily::CommandReply,
            Self::Event => MessageFamily::Event,
        }
    }
}

/// An immutable typed message envelope.
///
/// A `Message` is never mutated once constructed; the few "updates" the
/// fabric needs (hub relaying) create a new message via cloning
/// ([`Message::forwarded_by`]). Cloning is cheap, as the payload is shared
/// behind an [`Arc`].
///
/// Messages are built through the composers
/// ([`MessageEmitter`](crate::dispatch::MessageEmitter)) or reconstructed off
/// the wire by the transport layer; application code never assembles the
/// fields by hand.
#[derive(Clone, Debug)]
pub struct Message {
    name: &'static str,
    origin: UnitId,
    sender: UnitId,
    target: Channel,
    hops: Vec<UnitId>,
    trace: Uuid,
    kind: MessageKind,
    body: Arc<dyn MessagePayload>,
    bag: PayloadBag,
    api_key: Option<String>,
}

impl Message {
    /// Crate-internal full constructor, used by the composers and the
    /// transport decode path.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        origin: UnitId,
        sender: UnitId,
        target: Channel,
        hops: Vec<UnitId>,
        trace: Uuid,
        kind: MessageKind,
        body: Arc<dyn MessagePayload>,
        bag: PayloadBag,
        api_key: Option<String>,
    ) -> Self {
        Self {
            name: body.name(),
            origin,
            sender,
            target,
            hops,
            trace,
            kind,
            body,
            bag,
            api_key,
        }
    }

    /// The hierarchical message name, e.g. `"command/project/create"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The component that originated the causal chain. Stable across hops.
    #[must_use]
    pub fn origin(&self) -> &UnitId {
        &self.origin
    }

    /// The component that most recently emitted this instance. Changes at
    /// each hop.
    #[must_use]
    pub fn sender(&self) -> &UnitId {
        &self.sender
    }

    /// The intended recipients.
    #[must_use]
    pub fn target(&self) -> &Channel {
        &self.target
    }

    /// The components this message has passed through, in order.
    #[must_use]
    pub fn hops(&self) -> &[UnitId] {
        &self.hops
    }

    /// The correlation id shared by all messages causally chained to the
    /// same command.
    #[must_use]
    pub const fn trace(&self) -> Uuid {
        self.trace
    }

    /// The family-specific data.
    #[must_use]
    pub const fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The family this message belongs to.
    #[must_use]
    pub const fn family(&self) -> MessageFamily {
        self.kind.family()
    }

    /// The typed payload.
    #[must_use]
    pub fn body(&self) -> &Arc<dyn MessagePayload> {
        &self.body
    }

    /// Downcasts the payload to a concrete type.
    #[must_use]
    pub fn body_as<M: MessagePayload>(&self) -> Option<&M> {
        self.body.as_any().downcast_ref::<M>()
    }

    /// The open key-value payload bag.
    #[must_use]
    pub const fn bag(&self) -> &PayloadBag {
        &self.bag
    }

    /// The API key attached to a protected message, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Whether this message's type demands an API key.
    #[must_use]
    pub fn protected(&self) -> bool {
        self.body.protected()
    }

    /// Whether this is a command.
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(self.kind, MessageKind::Command { .. })
    }

    /// Whether this is a command reply.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        matches!(self.kind, MessageKind::CommandReply { .. })
    }

    /// Whether this is an event.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        matches!(self.kind, MessageKind::Event)
    }

    /// The command correlation id, for commands and replies.
    #[must_use]
    pub const fn unique(&self) -> Option<Uuid> {
        match &self.kind {
            MessageKind::Command { unique }
            | MessageKind::CommandReply { unique, .. } => Some(*unique),
            MessageKind::Event => None,
        }
    }

    /// A copy of this message as relayed by `relay`: the sender is replaced
    /// and the relay is appended to the hop trail. All other fields,
    /// including origin and trace, are preserved.
    #[must_use]
    pub fn forwarded_by(&self, relay: UnitId) -> Self {
        let mut forwarded = self.clone();
        if forwarded.hops.last() != Some(&relay) {
            forwarded.hops.push(relay.clone());
        }
        forwarded.sender = relay;
        forwarded
    }
}
