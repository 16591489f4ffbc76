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

//! Fluent message composers.
//!
//! Composers collapse "create a message of type `M`, optionally chain it to
//! a previous message, attach callbacks and a timeout, then dispatch it to a
//! channel" into one fluent call ending in `emit()`. They are the only way
//! application code constructs messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;
use uuid::Uuid;

use crate::common::{UnitId, WeftConfig};
use crate::dispatch::MessageBus;
use crate::message::{
    Channel, CommandMeta, FailKind, Message, MessageKind, MessageMeta, PayloadBag,
};
use crate::traits::{MessageFamily, MessagePayload, TypedPayload};

/// Builds and dispatches messages on behalf of one origin component or
/// service.
///
/// Obtained from [`Component::emitter`](crate::service::Component::emitter)
/// or, inside handlers, through the
/// [`ServiceContext`](crate::dispatch::ServiceContext).
#[derive(Clone)]
pub struct MessageEmitter {
    origin: UnitId,
    bus: Arc<MessageBus>,
    config: Arc<WeftConfig>,
}

impl std::fmt::Debug for MessageEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageEmitter")
            .field("origin", &self.origin)
            .finish()
    }
}

impl MessageEmitter {
    pub(crate) fn new(origin: UnitId, bus: Arc<MessageBus>, config: Arc<WeftConfig>) -> Self {
        Self {
            origin,
            bus,
            config,
        }
    }

    /// The origin every message built here is stamped with.
    #[must_use]
    pub fn origin(&self) -> &UnitId {
        &self.origin
    }

    /// Starts composing a command.
    ///
    /// # Panics
    ///
    /// Panics if `M` is not of the command family. That is a wiring bug,
    /// not a runtime condition.
    #[must_use]
    pub fn command<M: TypedPayload>(&self, body: M) -> CommandBuilder {
        assert_eq!(
            M::FAMILY,
            MessageFamily::Command,
            "{} is not a command type",
            M::NAME
        );
        CommandBuilder {
            common: self.common(Arc::new(body)),
            done: Vec::new(),
            fail: Vec::new(),
            async_callbacks: false,
            timeout: None,
        }
    }

    /// Starts composing an event.
    ///
    /// # Panics
    ///
    /// Panics if `M` is not of the event family.
    #[must_use]
    pub fn event<M: TypedPayload>(&self, body: M) -> EventBuilder {
        assert_eq!(
            M::FAMILY,
            MessageFamily::Event,
            "{} is not an event type",
            M::NAME
        );
        EventBuilder {
            common: self.common(Arc::new(body)),
        }
    }

    /// Starts composing the reply to a command.
    ///
    /// The reply adopts the command's trace and unique id, and its target is
    /// selected automatically: the local channel when the replying component
    /// is the command's origin, a direct channel back to the origin
    /// otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `M` is not of the reply family or `command` is not a
    /// command, both wiring bugs.
    #[must_use]
    pub fn reply_to<M: TypedPayload>(
        &self,
        command: &Message,
        body: M,
        success: bool,
        message: impl Into<String>,
    ) -> ReplyBuilder {
        assert_eq!(
            M::FAMILY,
            MessageFamily::CommandReply,
            "{} is not a command reply type",
            M::NAME
        );
        let unique = command
            .unique()
            .unwrap_or_else(|| panic!("replying to non-command message {}", command.name()));
        let target = if command.origin().matches(&self.origin) {
            Channel::local()
        } else {
            Channel::direct(command.origin().clone())
        };
        let mut common = self.common(Arc::new(body));
        common.target = target;
        common.trace = Some(command.trace());
        ReplyBuilder {
            common,
            unique,
            success,
            message: message.into(),
            signal: None,
        }
    }

    fn common(&self, body: Arc<dyn MessagePayload>) -> BuilderCommon {
        BuilderCommon {
            origin: self.origin.clone(),
            bus: self.bus.clone(),
            config: self.config.clone(),
            body,
            target: Channel::local(),
            trace: None,
            bag: PayloadBag::default(),
        }
    }
}

/// Fields shared by all three builders.
struct BuilderCommon {
    origin: UnitId,
    bus: Arc<MessageBus>,
    config: Arc<WeftConfig>,
    body: Arc<dyn MessagePayload>,
    target: Channel,
    trace: Option<Uuid>,
    bag: PayloadBag,
}

impl BuilderCommon {
    fn assemble(self, kind: MessageKind) -> (Arc<MessageBus>, Message) {
        // Protected messages carry this component's configured key; the
        // receiving router checks it against its own.
        let api_key = if self.body.protected() {
            Some(self.config.general.api_key.clone())
        } else {
            None
        };
        let msg = Message::assemble(
            self.origin.clone(),
            self.origin.clone(),
            self.target,
            vec![self.origin],
            self.trace.unwrap_or_else(Uuid::new_v4),
            kind,
            self.body,
            self.bag,
            api_key,
        );
        (self.bus, msg)
    }
}

/// Composer for commands.
pub struct CommandBuilder {
    common: BuilderCommon,
    done: Vec<crate::message::DoneCallback>,
    fail: Vec<crate::message::FailCallback>,
    async_callbacks: bool,
    timeout: Option<std::time::Duration>,
}

impl CommandBuilder {
    /// Sets the destination channel. Defaults to local.
    #[must_use]
    pub fn to(mut self, channel: Channel) -> Self {
        self.common.target = channel;
        self
    }

    /// Chains this command to a previous message, adopting its trace so the
    /// whole causal sequence can be correlated in logs.
    #[must_use]
    pub fn chain(mut self, msg: &Message) -> Self {
        self.common.trace = Some(msg.trace());
        self
    }

    /// Appends a callback invoked once with the reply when the command
    /// succeeds. Callbacks run in registration order.
    #[must_use]
    pub fn done(mut self, callback: impl FnOnce(Message) + Send + Sync + 'static) -> Self {
        self.done.push(Box::new(callback));
        self
    }

    /// Appends a callback invoked once when the command fails or times out.
    #[must_use]
    pub fn failed(
        mut self,
        callback: impl FnOnce(FailKind, String) + Send + Sync + 'static,
    ) -> Self {
        self.fail.push(Box::new(callback));
        self
    }

    /// Runs each callback on its own worker task instead of inline.
    #[must_use]
    pub fn async_callbacks(mut self, asynchronous: bool) -> Self {
        self.async_callbacks = asynchronous;
        self
    }

    /// Overrides the reply timeout (`Duration::ZERO` = wait forever).
    /// Defaults to the configured command timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds an ad hoc value to the open payload bag.
    #[must_use]
    pub fn bag(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.common.bag.insert(key.into(), value);
        self
    }

    /// Dispatches the command and returns its unique correlation id.
    pub async fn emit(self) -> Uuid {
        let unique = Uuid::new_v4();
        let timeout = self
            .timeout
            .unwrap_or_else(|| self.common.config.command_timeout());
        let mut command_meta = CommandMeta::with_timeout(timeout);
        command_meta.done = self.done;
        command_meta.fail = self.fail;
        command_meta.set_async_callbacks(self.async_callbacks);
        let (bus, msg) = self.common.assemble(MessageKind::Command { unique });
        trace!(name = msg.name(), %unique, "emitting command");
        bus.dispatch(msg, MessageMeta::local_command(command_meta)).await;
        unique
    }
}

/// Composer for events.
pub struct EventBuilder {
    common: BuilderCommon,
}

impl EventBuilder {
    /// Sets the destination channel. Defaults to local.
    #[must_use]
    pub fn to(mut self, channel: Channel) -> Self {
        self.common.target = channel;
        self
    }

    /// Chains this event to a previous message, adopting its trace.
    #[must_use]
    pub fn chain(mut self, msg: &Message) -> Self {
        self.common.trace = Some(msg.trace());
        self
    }

    /// Adds an ad hoc value to the open payload bag.
    #[must_use]
    pub fn bag(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.common.bag.insert(key.into(), value);
        self
    }

    /// Dispatches the event. Fire-and-forget: zero or more consumers, no
    /// reply expected.
    pub async fn emit(self) {
        let (bus, msg) = self.common.assemble(MessageKind::Event);
        trace!(name = msg.name(), "emitting event");
        bus.dispatch(msg, MessageMeta::local()).await;
    }
}

/// Composer for command replies.
pub struct ReplyBuilder {
    common: BuilderCommon,
    unique: Uuid,
    success: bool,
    message: String,
    signal: Option<Arc<AtomicBool>>,
}

impl ReplyBuilder {
    /// Adds an ad hoc value to the open payload bag.
    #[must_use]
    pub fn bag(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.common.bag.insert(key.into(), value);
        self
    }

    pub(crate) fn signal(mut self, flag: Arc<AtomicBool>) -> Self {
        self.signal = Some(flag);
        self
    }

    /// Dispatches the reply.
    pub async fn emit(self) {
        if let Some(flag) = &self.signal {
            flag.store(true, Ordering::SeqCst);
        }
        let (unique, success) = (self.unique, self.success);
        let (bus, msg) = self.common.assemble(MessageKind::CommandReply {
            unique,
            success,
            message: self.message,
        });
        trace!(name = msg.name(), %unique, success, "emitting command reply");
        bus.dispatch(msg, MessageMeta::local()).await;
    }
}
