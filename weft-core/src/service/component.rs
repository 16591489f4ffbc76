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

use tracing::info;

use crate::common::{UnitId, WeftConfig};
use crate::dispatch::{MessageBus, MessageEmitter};
use crate::message::{MessageTypeRegistry, RegistryError};
use crate::routing::{HubRouter, LeafRouter, NodeRouter};
use crate::service::Service;
use crate::traits::{MessageRouter, TypedPayload};
use crate::transport::register_core_message_types;

/// The routing role a component plays in the fabric topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentRole {
    /// An edge component: one upstream connection, no clients of its own.
    Leaf,
    /// An intermediary relaying in both directions.
    Node,
    /// The central component serving many clients.
    Hub,
}

/// One running fabric participant: an identity, a role-specific router, the
/// type registry, and the message bus, assembled and started together.
///
/// This is the entry point of the crate: create a component, register
/// message types and services, then emit messages:
///
/// ```ignore
/// let component = Component::new(
///     UnitId::new("infra", "server"),
///     ComponentRole::Hub,
///     WeftConfig::default(),
/// )?;
/// component.register_message_type::<CreateProject>()?;
/// component.register_service(service);
/// component.emitter().event(ServerStarted::default()).emit().await;
/// ```
pub struct Component {
    id: UnitId,
    role: ComponentRole,
    config: Arc<WeftConfig>,
    registry: Arc<MessageTypeRegistry>,
    bus: Arc<MessageBus>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("role", &self.role)
            .finish()
    }
}

impl Component {
    /// Assembles and starts a component. The built-in network event types
    /// are registered up front; application types follow via
    /// [`register_message_type`](Component::register_message_type).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(id: UnitId, role: ComponentRole, config: WeftConfig) -> Result<Self, RegistryError> {
        let config = Arc::new(config);
        let registry = Arc::new(MessageTypeRegistry::new());
        register_core_message_types(&registry)?;

        let api_key = config.general.api_key.clone();
        let router: Arc<dyn MessageRouter> = match role {
            ComponentRole::Leaf => Arc::new(LeafRouter::new(id.clone(), api_key)),
            ComponentRole::Node => Arc::new(NodeRouter::new(id.clone(), api_key)),
            ComponentRole::Hub => Arc::new(HubRouter::new(id.clone(), api_key)),
        };

        info!(id = %id, ?role, "starting component");
        let bus = MessageBus::start(id.clone(), config.clone(), router, registry.clone());
        Ok(Self {
            id,
            role,
            config,
            registry,
            bus,
        })
    }

    /// This component's identity.
    #[must_use]
    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// The routing role this component was created with.
    #[must_use]
    pub fn role(&self) -> ComponentRole {
        self.role
    }

    /// The component configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<WeftConfig> {
        &self.config
    }

    /// The message type registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<MessageTypeRegistry> {
        &self.registry
    }

    /// The message bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    /// Makes a message type reconstructible off the wire.
    pub fn register_message_type<M: TypedPayload>(&self) -> Result<(), RegistryError> {
        self.registry.register::<M>()
    }

    /// Creates an empty service carrying this component's identity as its
    /// origin. Register it with
    /// [`register_service`](Component::register_service) once its handlers
    /// are in place.
    #[must_use]
    pub fn create_service(&self, name: impl Into<String>) -> Service {
        Service::new(name, self.id.clone())
    }

    /// Activates a service: from now on its handlers receive matching
    /// messages.
    pub fn register_service(&self, service: Service) {
        self.bus.register_service(service);
    }

    /// A message emitter stamped with this component's identity.
    #[must_use]
    pub fn emitter(&self) -> MessageEmitter {
        self.bus.emitter(self.id.clone())
    }

    /// Stops the bus and every transport read loop attached to it.
    pub fn shutdown(&self) {
        info!(id = %self.id, "shutting down component");
        self.bus.shutdown();
    }
}
