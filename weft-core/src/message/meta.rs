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

use std::fmt;
use std::time::Duration;

use crate::message::Message;

/// How a message entered the current process.
///
/// Transports must tag incoming messages with the side the bytes physically
/// arrived on; the routers rely on this to prevent echo loops and injected
/// local-only messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entrypoint {
    /// Emitted by code running in this very process.
    Local,
    /// Received on a server-side connection (i.e. from one of our clients).
    Server,
    /// Received on a client-side connection (i.e. from our server).
    Client,
}

/// Invoked once with the reply when the command it was attached to succeeds.
pub type DoneCallback = Box<dyn FnOnce(Message) + Send + Sync>;

/// Invoked once with the failure kind and a detail string when a command
/// fails or times out.
pub type FailCallback = Box<dyn FnOnce(FailKind, String) + Send + Sync>;

/// Why a command's fail callbacks fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailKind {
    /// No reply arrived within the command's timeout.
    Timeout,
    /// A reply arrived carrying `success == false`.
    Failed,
    /// Anything else.
    Unknown,
}

impl fmt::Display for FailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reply bookkeeping attached to a command dispatch.
///
/// Moved into the pending-command tracker before any handler runs, so a
/// synchronous same-task reply cannot race the insertion.
pub struct CommandMeta {
    pub(crate) done: Vec<DoneCallback>,
    pub(crate) fail: Vec<FailCallback>,
    pub(crate) async_callbacks: bool,
    pub(crate) timeout: Duration,
}

impl CommandMeta {
    /// Creates empty bookkeeping with the given reply timeout
    /// (`Duration::ZERO` = never expires).
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            done: Vec::new(),
            fail: Vec::new(),
            async_callbacks: false,
            timeout,
        }
    }

    /// Appends a done callback.
    pub fn push_done(&mut self, callback: DoneCallback) {
        self.done.push(callback);
    }

    /// Appends a fail callback.
    pub fn push_fail(&mut self, callback: FailCallback) {
        self.fail.push(callback);
    }

    /// Whether callbacks run on their own worker tasks instead of inline.
    pub fn set_async_callbacks(&mut self, asynchronous: bool) {
        self.async_callbacks = asynchronous;
    }
}

impl fmt::Debug for CommandMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMeta")
            .field("done", &self.done.len())
            .field("fail", &self.fail.len())
            .field("async_callbacks", &self.async_callbacks)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Per-dispatch bookkeeping attached to (but not part of) a message.
///
/// Created fresh immediately before a `dispatch` call and consumed by it;
/// never serialized, never reused.
#[derive(Debug)]
pub struct MessageMeta {
    entrypoint: Entrypoint,
    command: Option<CommandMeta>,
}

impl MessageMeta {
    /// Meta for a locally emitted message.
    #[must_use]
    pub fn local() -> Self {
        Self {
            entrypoint: Entrypoint::Local,
            command: None,
        }
    }

    /// Meta for a message received off the wire.
    #[must_use]
    pub fn remote(entrypoint: Entrypoint) -> Self {
        Self {
            entrypoint,
            command: None,
        }
    }

    /// Meta for a locally emitted command with reply bookkeeping.
    #[must_use]
    pub fn local_command(command: CommandMeta) -> Self {
        Self {
            entrypoint: Entrypoint::Local,
            command: Some(command),
        }
    }

    /// How the message entered this process.
    #[must_use]
    pub const fn entrypoint(&self) -> Entrypoint {
        self.entrypoint
    }

    /// Takes the command bookkeeping out of the meta, leaving `None`.
    pub(crate) fn take_command(&mut self) -> Option<CommandMeta> {
        self.command.take()
    }
}
