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

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::UnitId;
use crate::message::{Channel, Message, MessageKind, MessageTypeRegistry, PayloadBag, RegistryError};

/// The self-describing serialized form of a [`Message`].
///
/// Everything a remote component needs to reconstruct the typed message is
/// in the frame: the envelope fields, the family-specific data, and the
/// payload fields as raw JSON. Reconstruction goes through the receiving
/// component's [`MessageTypeRegistry`], which is the only place the raw
/// fields are bound back to a concrete type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireMessage {
    /// The hierarchical message name.
    pub name: String,
    /// The originating component.
    pub origin: UnitId,
    /// The most recent emitter.
    pub sender: UnitId,
    /// The destination channel.
    pub target: Channel,
    /// The hop trail.
    pub hops: Vec<UnitId>,
    /// The trace correlation id.
    pub trace: Uuid,
    /// The family-specific data, flattened so `family` tags the frame.
    #[serde(flatten)]
    pub kind: MessageKind,
    /// The API key for protected messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// The typed payload fields as raw JSON.
    pub fields: serde_json::Value,
    /// The open key-value payload bag.
    #[serde(default)]
    pub bag: PayloadBag,
}

impl WireMessage {
    /// Serializes a message into its wire form.
    ///
    /// # Errors
    ///
    /// Fails only when the payload fields cannot be serialized to JSON.
    pub fn from_message(msg: &Message) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: msg.name().to_string(),
            origin: msg.origin().clone(),
            sender: msg.sender().clone(),
            target: msg.target().clone(),
            hops: msg.hops().to_vec(),
            trace: msg.trace(),
            kind: msg.kind().clone(),
            api_key: msg.api_key().map(str::to_string),
            fields: msg.body().to_json()?,
            bag: msg.bag().clone(),
        })
    }

    /// Reconstructs the typed message, resolving the payload type through
    /// the registry.
    ///
    /// # Errors
    ///
    /// Propagates the registry's verdict: unknown name, family mismatch, or
    /// undecodable fields.
    pub fn into_message(self, registry: &MessageTypeRegistry) -> Result<Message, RegistryError> {
        let body = registry.decode(&self.name, self.kind.family(), &self.fields)?;
        Ok(Message::assemble(
            self.origin,
            self.sender,
            self.target,
            self.hops,
            self.trace,
            self.kind,
            body,
            self.bag,
            self.api_key,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::traits::{MessageFamily, TypedPayload};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Probe {
        value: u32,
    }

    impl TypedPayload for Probe {
        const NAME: &'static str = "event/test/probe";
        const FAMILY: MessageFamily = MessageFamily::Event;
    }

    #[test]
    fn frames_survive_the_wire() {
        let registry = MessageTypeRegistry::new();
        registry.register::<Probe>().unwrap();

        let origin = UnitId::with_instance("web", "frontend", "1");
        let msg = Message::assemble(
            origin.clone(),
            origin.clone(),
            Channel::global(),
            vec![origin.clone()],
            Uuid::new_v4(),
            MessageKind::Event,
            Arc::new(Probe { value: 11 }),
            PayloadBag::default(),
            None,
        );

        let frame = WireMessage::from_message(&msg).unwrap();
        // Simulate the socket: full JSON serialization and back.
        let json = serde_json::to_string(&frame).unwrap();
        let frame: WireMessage = serde_json::from_str(&json).unwrap();

        let restored = frame.into_message(&registry).unwrap();
        assert_eq!(restored.name(), msg.name());
        assert_eq!(restored.origin(), &origin);
        assert_eq!(restored.trace(), msg.trace());
        assert_eq!(restored.body_as::<Probe>().unwrap().value, 11);
    }

    #[test]
    fn unknown_frames_are_rejected() {
        let registry = MessageTypeRegistry::new();
        let origin = UnitId::new("infra", "server");
        let msg = Message::assemble(
            origin.clone(),
            origin.clone(),
            Channel::global(),
            vec![origin],
            Uuid::new_v4(),
            MessageKind::Event,
            Arc::new(Probe { value: 0 }),
            PayloadBag::default(),
            None,
        );
        let frame = WireMessage::from_message(&msg).unwrap();
        assert!(matches!(
            frame.into_message(&registry),
            Err(RegistryError::Unknown(_))
        ));
    }
}
