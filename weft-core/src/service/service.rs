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

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::common::UnitId;
use crate::dispatch::ServiceContext;
use crate::message::Message;
use crate::routing::NamePattern;
use crate::traits::{MessageFamily, TypedPayload};

/// Type-erased handler invoked by the bus for each matching message.
pub(crate) type HandlerFn =
    Arc<dyn Fn(Message, ServiceContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// One registered handler: a name filter, the family it listens to, an
/// optional concrete payload type, and the function itself.
#[derive(Clone)]
pub struct HandlerEntry {
    pub(crate) filter: NamePattern,
    pub(crate) family: MessageFamily,
    pub(crate) type_id: Option<TypeId>,
    pub(crate) func: HandlerFn,
    pub(crate) is_async: bool,
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("filter", &self.filter)
            .field("family", &self.family)
            .field("is_async", &self.is_async)
            .finish()
    }
}

impl HandlerEntry {
    fn accepts(&self, msg: &Message) -> bool {
        if self.family != msg.family() || !self.filter.matches(msg.name()) {
            return false;
        }
        match self.type_id {
            Some(type_id) => type_id == msg.body().as_any().type_id(),
            None => true,
        }
    }
}

/// A named collection of message handlers sharing one origin identity.
///
/// Services are assembled at startup: register handlers with
/// [`handle`](Service::handle) and hand the finished service to
/// [`Component::register_service`](crate::service::Component::register_service).
/// After registration the handler set is immutable.
///
/// # Example
///
/// ```ignore
/// let mut service = component.create_service("project service");
/// service.handle(|cmd: CreateProject, _msg, ctx| async move {
///     ctx.reply(CreateProjectReply::default(), true, "").emit().await;
///     Ok(())
/// });
/// component.register_service(service);
/// ```
pub struct Service {
    name: String,
    origin: UnitId,
    handlers: Vec<HandlerEntry>,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Service {
    /// Creates an empty service. Prefer
    /// [`Component::create_service`](crate::service::Component::create_service),
    /// which fills in the component's identity as the origin.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: UnitId) -> Self {
        Self {
            name: name.into(),
            origin,
            handlers: Vec::new(),
        }
    }

    /// Registers a typed handler for the message type `M`, filtered to
    /// exactly `M::NAME`. The handler runs on its own task.
    pub fn handle<M, F, Fut>(&mut self, handler: F) -> &mut Self
    where
        M: TypedPayload,
        F: Fn(M, Message, ServiceContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handle_with::<M, F, Fut>(M::NAME, true, handler)
    }

    /// Registers a typed handler with an explicit name filter and execution
    /// mode. Synchronous handlers (`is_async == false`) run inline on the
    /// dispatching task, in registration order relative to each other.
    pub fn handle_with<M, F, Fut>(
        &mut self,
        filter: impl Into<String>,
        is_async: bool,
        handler: F,
    ) -> &mut Self
    where
        M: TypedPayload,
        F: Fn(M, Message, ServiceContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let func: HandlerFn = Arc::new(move |msg: Message, ctx: ServiceContext| {
            match msg.body_as::<M>().cloned() {
                Some(body) => handler(body, msg, ctx).boxed(),
                None => {
                    let err = anyhow!("payload of {} is not a {}", msg.name(), M::NAME);
                    futures::future::ready(Err(err)).boxed()
                }
            }
        });
        self.handlers.push(HandlerEntry {
            filter: NamePattern::new(filter),
            family: M::FAMILY,
            type_id: Some(TypeId::of::<M>()),
            func,
            is_async,
        });
        self
    }

    /// Registers an untyped handler matching every message of `family`
    /// whose name matches `filter`, e.g. a wildcard event listener over
    /// `event/network/*`.
    pub fn handle_any<F, Fut>(
        &mut self,
        filter: impl Into<String>,
        family: MessageFamily,
        is_async: bool,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(Message, ServiceContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let func: HandlerFn =
            Arc::new(move |msg: Message, ctx: ServiceContext| handler(msg, ctx).boxed());
        self.handlers.push(HandlerEntry {
            filter: NamePattern::new(filter),
            family,
            type_id: None,
            func,
            is_async,
        });
        self
    }

    /// All handlers accepting the given message, in registration order.
    #[must_use]
    pub(crate) fn matching_handlers(&self, msg: &Message) -> Vec<HandlerEntry> {
        self.handlers
            .iter()
            .filter(|handler| handler.accepts(msg))
            .cloned()
            .collect()
    }

    /// The service name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity outgoing messages from this service's handlers carry.
    #[must_use]
    pub fn origin(&self) -> &UnitId {
        &self.origin
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::*;
    use crate::message::{Channel, MessageKind, PayloadBag};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Ping;

    impl TypedPayload for Ping {
        const NAME: &'static str = "command/test/ping";
        const FAMILY: MessageFamily = MessageFamily::Command;
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Pulse;

    impl TypedPayload for Pulse {
        const NAME: &'static str = "event/test/pulse";
        const FAMILY: MessageFamily = MessageFamily::Event;
    }

    fn message_of<M: TypedPayload>(body: M, kind: MessageKind) -> Message {
        let origin = UnitId::new("infra", "server");
        Message::assemble(
            origin.clone(),
            origin.clone(),
            Channel::local(),
            vec![origin],
            Uuid::new_v4(),
            kind,
            Arc::new(body),
            PayloadBag::default(),
            None,
        )
    }

    #[test]
    fn typed_handlers_match_name_family_and_type() {
        let mut service = Service::new("test", UnitId::new("infra", "server"));
        service.handle(|_: Ping, _, _| async { Ok(()) });
        service.handle(|_: Pulse, _, _| async { Ok(()) });

        let ping = message_of(Ping, MessageKind::Command { unique: Uuid::new_v4() });
        assert_eq!(service.matching_handlers(&ping).len(), 1);
        let pulse = message_of(Pulse, MessageKind::Event);
        assert_eq!(service.matching_handlers(&pulse).len(), 1);
    }

    #[test]
    fn wildcard_handlers_match_by_family() {
        let mut service = Service::new("test", UnitId::new("infra", "server"));
        service.handle_any("event/test/*", MessageFamily::Event, true, |_, _| async {
            Ok(())
        });

        let pulse = message_of(Pulse, MessageKind::Event);
        assert_eq!(service.matching_handlers(&pulse).len(), 1);
        // Same name shape, wrong family.
        let ping = message_of(Ping, MessageKind::Command { unique: Uuid::new_v4() });
        assert!(service.matching_handlers(&ping).is_empty());
    }

    #[test]
    fn mismatched_names_do_not_match() {
        let mut service = Service::new("test", UnitId::new("infra", "server"));
        service.handle(|_: Ping, _, _| async { Ok(()) });
        let pulse = message_of(Pulse, MessageKind::Event);
        assert!(service.matching_handlers(&pulse).is_empty());
    }
}
