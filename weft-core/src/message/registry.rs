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

//! Message type registry for wire-format reconstruction.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::traits::{MessageFamily, MessagePayload, TypedPayload};

/// Decoder stored per registered type: raw JSON fields in, typed payload out.
type DecoderFn =
    Arc<dyn Fn(&serde_json::Value) -> Result<Arc<dyn MessagePayload>, RegistryError> + Send + Sync>;

struct RegisteredType {
    type_id: TypeId,
    family: MessageFamily,
    decoder: DecoderFn,
}

/// Errors raised by the message type registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already bound to a different concrete type. This is a
    /// wiring bug and should be surfaced at startup, not swallowed.
    #[error("message name {name:?} is already registered to a different type")]
    Conflict {
        /// The conflicting message name.
        name: String,
    },
    /// No type is registered under the name found on the wire.
    #[error("unknown message type {0:?}")]
    Unknown(String),
    /// The wire frame's family does not match the registered type's family.
    #[error("message {name:?} carries family {got:?}, registered as {expected:?}")]
    FamilyMismatch {
        /// The message name.
        name: String,
        /// The family the type was registered with.
        expected: MessageFamily,
        /// The family found on the wire.
        got: MessageFamily,
    },
    /// The payload fields failed to deserialize into the registered type.
    #[error("failed to decode fields of message {name:?}: {source}")]
    Decode {
        /// The message name.
        name: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Maps message names to their concrete payload types.
///
/// The registry exists solely for the network receive path: a frame arrives
/// as `(name, json fields)` and the registry reconstructs the typed payload.
/// The in-process path never consults it, since the concrete type is known at
/// the call site.
///
/// Registries are explicit objects owned by a component, populated by
/// deterministic registration routines at startup. There is no global
/// catalog; tests instantiate isolated registries.
#[derive(Default)]
pub struct MessageTypeRegistry {
    types: DashMap<String, RegisteredType>,
}

impl std::fmt::Debug for MessageTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageTypeRegistry")
            .field("registered_types", &self.types.len())
            .finish()
    }
}

impl MessageTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload type under its canonical name.
    ///
    /// Registering the same type twice is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Conflict`] when the name is already bound to
    /// a *different* type.
    pub fn register<M: TypedPayload>(&self) -> Result<(), RegistryError> {
        match self.types.entry(M::NAME.to_string()) {
            Entry::Occupied(occupied) => {
                if occupied.get().type_id == TypeId::of::<M>() {
                    Ok(())
                } else {
                    Err(RegistryError::Conflict {
                        name: M::NAME.to_string(),
                    })
                }
            }
            Entry::Vacant(vacant) => {
                let decoder: DecoderFn = Arc::new(|fields| {
                    let payload: M = serde_json::from_value(fields.clone()).map_err(|source| {
                        RegistryError::Decode {
                            name: M::NAME.to_string(),
                            source,
                        }
                    })?;
                    Ok(Arc::new(payload) as Arc<dyn MessagePayload>)
                });
                vacant.insert(RegisteredType {
                    type_id: TypeId::of::<M>(),
                    family: M::FAMILY,
                    decoder,
                });
                Ok(())
            }
        }
    }

    /// Whether a type is registered under the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Reconstructs a typed payload from raw wire data.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unknown`] for unregistered names,
    /// [`RegistryError::FamilyMismatch`] when the frame's family disagrees
    /// with the registration, and [`RegistryError::Decode`] when the fields
    /// don't deserialize.
    pub fn decode(
        &self,
        name: &str,
        family: MessageFamily,
        fields: &serde_json::Value,
    ) -> Result<Arc<dyn MessagePayload>, RegistryError> {
        let registered = self
            .types
            .get(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        if registered.family != family {
            return Err(RegistryError::FamilyMismatch {
                name: name.to_string(),
                expected: registered.family,
                got: family,
            });
        }
        (registered.decoder)(fields)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Probe {
        value: u32,
    }

    impl TypedPayload for Probe {
        const NAME: &'static str = "event/test/probe";
        const FAMILY: MessageFamily = MessageFamily::Event;
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Impostor;

    impl TypedPayload for Impostor {
        const NAME: &'static str = "event/test/probe";
        const FAMILY: MessageFamily = MessageFamily::Event;
    }

    #[test]
    fn reregistering_same_type_is_a_no_op() {
        let registry = MessageTypeRegistry::new();
        registry.register::<Probe>().unwrap();
        registry.register::<Probe>().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_registration_fails() {
        let registry = MessageTypeRegistry::new();
        registry.register::<Probe>().unwrap();
        assert!(matches!(
            registry.register::<Impostor>(),
            Err(RegistryError::Conflict { .. })
        ));
    }

    #[test]
    fn decode_reconstructs_typed_payload() {
        let registry = MessageTypeRegistry::new();
        registry.register::<Probe>().unwrap();
        let fields = serde_json::json!({ "value": 42 });
        let payload = registry
            .decode("event/test/probe", MessageFamily::Event, &fields)
            .unwrap();
        let probe = payload.as_any().downcast_ref::<Probe>().unwrap();
        assert_eq!(probe.value, 42);
    }

    #[test]
    fn decode_rejects_unknown_and_mismatched() {
        let registry = MessageTypeRegistry::new();
        registry.register::<Probe>().unwrap();
        let fields = serde_json::json!({ "value": 1 });
        assert!(matches!(
            registry.decode("event/test/other", MessageFamily::Event, &fields),
            Err(RegistryError::Unknown(_))
        ));
        assert!(matches!(
            registry.decode("event/test/probe", MessageFamily::Command, &fields),
            Err(RegistryError::FamilyMismatch { .. })
        ));
    }
}
