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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::common::WeftConfig;
use crate::dispatch::{CommandBuilder, EventBuilder, MessageEmitter, ReplyBuilder};
use crate::message::Message;
use crate::traits::TypedPayload;

/// Per-invocation context handed to a message handler.
///
/// A fresh context is created for every handler call; it carries the message
/// being handled, an emitter bound to the owning service's origin, and the
/// component configuration. Replying to a command goes through
/// [`reply`](ServiceContext::reply) so the reply inherits the command's
/// trace and correlation id without the handler having to thread them
/// through manually.
#[derive(Clone, Debug)]
pub struct ServiceContext {
    emitter: MessageEmitter,
    service: Arc<str>,
    config: Arc<WeftConfig>,
    request: Message,
    reply_signal: Arc<AtomicBool>,
}

impl ServiceContext {
    pub(crate) fn new(
        emitter: MessageEmitter,
        service: String,
        config: Arc<WeftConfig>,
        request: Message,
    ) -> Self {
        Self {
            emitter,
            service: service.into(),
            config,
            request,
            reply_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The message this handler was invoked with.
    #[must_use]
    pub fn message(&self) -> &Message {
        &self.request
    }

    /// Name of the service the running handler belongs to.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The component configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<WeftConfig> {
        &self.config
    }

    /// Starts composing a new command from within the handler. The command
    /// is automatically chained to the message being handled.
    #[must_use]
    pub fn command<M: TypedPayload>(&self, body: M) -> CommandBuilder {
        self.emitter.command(body).chain(&self.request)
    }

    /// Starts composing a new event from within the handler, chained to the
    /// message being handled.
    #[must_use]
    pub fn event<M: TypedPayload>(&self, body: M) -> EventBuilder {
        self.emitter.event(body).chain(&self.request)
    }

    /// Starts composing the reply to the command being handled.
    ///
    /// # Panics
    ///
    /// Panics if the handled message is not a command, or `M` is not a
    /// reply type.
    #[must_use]
    pub fn reply<M: TypedPayload>(
        &self,
        body: M,
        success: bool,
        message: impl Into<String>,
    ) -> ReplyBuilder {
        self.emitter
            .reply_to(&self.request, body, success, message)
            .signal(self.reply_signal.clone())
    }

    pub(crate) fn reply_emitted(&self) -> bool {
        self.reply_signal.load(Ordering::SeqCst)
    }
}
