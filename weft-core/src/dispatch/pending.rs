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
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::message::{CommandMeta, FailKind, Message};

/// One in-flight command awaiting its reply.
///
/// Owned exclusively by the tracker; destroyed on first reply match or
/// timeout, whichever comes first.
pub struct PendingEntry {
    done: Vec<crate::message::DoneCallback>,
    fail: Vec<crate::message::FailCallback>,
    async_callbacks: bool,
    timeout: Duration,
    inserted_at: Instant,
}

impl fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEntry")
            .field("done", &self.done.len())
            .field("fail", &self.fail.len())
            .field("async_callbacks", &self.async_callbacks)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PendingEntry {
    /// Derives a tracker entry from a command's dispatch bookkeeping.
    #[must_use]
    pub fn from_meta(meta: CommandMeta) -> Self {
        Self {
            done: meta.done,
            fail: meta.fail,
            async_callbacks: meta.async_callbacks,
            timeout: meta.timeout,
            inserted_at: Instant::now(),
        }
    }

    fn expired(&self, now: Instant) -> bool {
        !self.timeout.is_zero() && now.duration_since(self.inserted_at) >= self.timeout
    }

    /// Invokes the done callbacks, each exactly once and in registration
    /// order, with its own clone of the reply.
    ///
    /// When the entry was marked for async callbacks, each one runs on its
    /// own spawned task; otherwise they run inline on the calling task.
    pub(crate) fn succeed(self, reply: &Message) {
        for callback in self.done {
            let reply = reply.clone();
            if self.async_callbacks {
                tokio::spawn(async move { callback(reply) });
            } else {
                callback(reply);
            }
        }
    }

    /// Invokes the fail callbacks, each exactly once and in registration
    /// order.
    pub(crate) fn fail(self, kind: FailKind, detail: &str) {
        for callback in self.fail {
            let detail = detail.to_string();
            if self.async_callbacks {
                tokio::spawn(async move { callback(kind, detail) });
            } else {
                callback(kind, detail);
            }
        }
    }
}

/// Thread-safe table of in-flight commands awaiting a reply, keyed by the
/// command's unique correlation id.
///
/// All operations are atomic with respect to each other; an id can be
/// settled by exactly one caller: whoever removes the entry (reply matcher
/// or the timeout sweep) owns its callbacks.
#[derive(Debug, Default)]
pub struct PendingCommands {
    entries: DashMap<Uuid, PendingEntry>,
}

impl PendingCommands {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry for the given command id. First writer wins: a
    /// second insert for the same id is logged and discarded, since at most
    /// one local dispatch may occur per command.
    pub fn add(&self, unique: Uuid, entry: PendingEntry) {
        match self.entries.entry(unique) {
            Entry::Occupied(_) => {
                warn!(%unique, "pending command already tracked, keeping the first entry");
            }
            Entry::Vacant(vacant) => {
                trace!(%unique, ?entry, "tracking pending command");
                vacant.insert(entry);
            }
        }
    }

    /// Atomically removes and returns the entry for the given id. At most
    /// one caller ever receives it.
    #[must_use]
    pub fn settle(&self, unique: Uuid) -> Option<PendingEntry> {
        self.entries.remove(&unique).map(|(_, entry)| entry)
    }

    /// Removes and returns every entry whose timeout has elapsed.
    #[must_use]
    pub fn take_expired(&self) -> Vec<(Uuid, PendingEntry)> {
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|entry| entry.value().expired(now))
            .map(|entry| *entry.key())
            .collect();
        expired
            .into_iter()
            .filter_map(|unique| self.entries.remove(&unique))
            .collect()
    }

    /// Number of in-flight commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no commands are in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
