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

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace, warn, Instrument};

use crate::common::{UnitId, WeftConfig};
use crate::dispatch::{MessageEmitter, PendingCommands, PendingEntry, ServiceContext};
use crate::message::{
    CommandMeta, Entrypoint, FailKind, Message, MessageKind, MessageMeta, MessageTypeRegistry,
};
use crate::service::Service;
use crate::traits::{ClientFanout, MessageRouter};
use crate::transport::{ConnectionErrorEvent, NetworkLayer, WireMessage};

/// The central dispatch orchestrator of a component.
///
/// One bus exists per process, shared by an arbitrary number of concurrent
/// callers. Its single operation is [`dispatch`](MessageBus::dispatch):
/// verify the message against the router, track commands, settle replies,
/// hand the message to every matching service handler, and push it to the
/// network layer, in that order, with local handling and remote forwarding
/// logically concurrent.
///
/// `dispatch` is effectively non-throwing: all operational failures (routing
/// rejections, timeouts, handler errors) are logged and surfaced through the
/// callback/event mechanism, never raised to unrelated callers.
pub struct MessageBus {
    own_id: UnitId,
    config: Arc<WeftConfig>,
    router: Arc<dyn MessageRouter>,
    registry: Arc<MessageTypeRegistry>,
    services: RwLock<Vec<Arc<Service>>>,
    pending: Arc<PendingCommands>,
    network: NetworkLayer,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("own_id", &self.own_id)
            .field("services", &self.services.read().len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl MessageBus {
    /// Creates the bus and starts its pending-command expiry sweep.
    ///
    /// Must be called from within a Tokio runtime; the sweep runs as a
    /// background task until [`shutdown`](MessageBus::shutdown).
    #[must_use]
    pub fn start(
        own_id: UnitId,
        config: Arc<WeftConfig>,
        router: Arc<dyn MessageRouter>,
        registry: Arc<MessageTypeRegistry>,
    ) -> Arc<Self> {
        let bus = Arc::new(Self {
            own_id,
            network: NetworkLayer::new(),
            config: config.clone(),
            router,
            registry,
            services: RwLock::new(Vec::new()),
            pending: Arc::new(PendingCommands::new()),
            shutdown: CancellationToken::new(),
        });
        Self::spawn_sweeper(
            bus.pending.clone(),
            config.sweep_interval(),
            bus.shutdown.clone(),
        );
        bus
    }

    /// The identity of the component this bus belongs to.
    #[must_use]
    pub fn own_id(&self) -> &UnitId {
        &self.own_id
    }

    /// The component configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<WeftConfig> {
        &self.config
    }

    /// The message type registry used to reconstruct wire frames.
    #[must_use]
    pub fn registry(&self) -> &Arc<MessageTypeRegistry> {
        &self.registry
    }

    /// Number of commands currently awaiting a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Appends a service to the handler registry. Registration happens once
    /// at startup per service; lookups during dispatch are read-only.
    pub fn register_service(&self, service: Service) {
        debug!(service = service.name(), handlers = service.handler_count(), "registering service");
        self.services.write().push(Arc::new(service));
    }

    /// Stops the expiry sweep and any transport read loops bound to this
    /// bus's shutdown token.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Token cancelled when the bus shuts down.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub(crate) fn network(&self) -> &NetworkLayer {
        &self.network
    }

    /// Dispatches one message with its per-dispatch meta-information.
    ///
    /// Never returns an error: a message that fails verification is logged
    /// and dropped, failures inside handlers are isolated per handler, and
    /// transport failures surface as connection events.
    #[instrument(skip_all, fields(name = %msg.name(), channel = %msg.target(), trace = %msg.trace(), entrypoint = ?meta.entrypoint()))]
    pub async fn dispatch(self: &Arc<Self>, msg: Message, mut meta: MessageMeta) {
        if let Err(err) = self.router.verify(&msg, &meta) {
            warn!(error = %err, "message dropped by routing verification");
            return;
        }

        // Commands originating here are tracked before any handler runs, so
        // a reply emitted synchronously by a same-task handler cannot race
        // the insertion.
        if msg.is_command() && meta.entrypoint() == Entrypoint::Local {
            if let Some(unique) = msg.unique() {
                let command_meta = meta
                    .take_command()
                    .unwrap_or_else(|| CommandMeta::with_timeout(self.config.command_timeout()));
                self.pending.add(unique, PendingEntry::from_meta(command_meta));
            }
        }

        if msg.is_reply() {
            self.settle_reply(&msg);
        }

        if self.router.dispatch_locally(&msg, &meta) {
            self.dispatch_to_services(&msg).await;
        }

        if self.router.forward_to_server(&msg, &meta) {
            // Re-stamped with this component as the sender so the upstream's
            // skip-by-sender echo guard can match the link the frame takes.
            let relayed = msg.forwarded_by(self.own_id.clone());
            self.network.send_to_server(&relayed).await;
        }

        match self.router.client_fanout(&msg, &meta) {
            ClientFanout::None => {}
            ClientFanout::Direct(target) => {
                let relayed = msg.forwarded_by(self.own_id.clone());
                self.network.send_to_client(&target, &relayed).await;
            }
            ClientFanout::Broadcast { skip } => {
                let relayed = msg.forwarded_by(self.own_id.clone());
                self.network.broadcast_to_clients(&relayed, &skip).await;
            }
        }
    }

    /// Entry point for transport receive loops: reconstructs the typed
    /// message off the wire and dispatches it.
    ///
    /// `entrypoint` must name the physical side the frame arrived on;
    /// routing correctness depends entirely on this tag being accurate.
    pub async fn dispatch_wire(self: &Arc<Self>, frame: WireMessage, entrypoint: Entrypoint) {
        match frame.into_message(&self.registry) {
            Ok(msg) => self.dispatch(msg, MessageMeta::remote(entrypoint)).await,
            Err(err) => {
                warn!(error = %err, "dropping undecodable frame");
                self.emitter(self.own_id.clone())
                    .event(ConnectionErrorEvent {
                        reason: err.to_string(),
                    })
                    .emit()
                    .await;
            }
        }
    }

    /// Builds a message emitter bound to the given origin.
    pub(crate) fn emitter(self: &Arc<Self>, origin: UnitId) -> MessageEmitter {
        MessageEmitter::new(origin, self.clone(), self.config.clone())
    }

    /// Settles a command reply against the pending tracker: exactly one
    /// callback set fires (done on success, fail otherwise) and the entry
    /// is removed. A reply with no tracked command (already settled, timed
    /// out, or tracked by another component) is logged and ignored.
    fn settle_reply(&self, msg: &Message) {
        let MessageKind::CommandReply {
            unique,
            success,
            message,
        } = msg.kind()
        else {
            return;
        };
        match self.pending.settle(*unique) {
            Some(entry) => {
                trace!(%unique, success, "settling tracked command");
                if *success {
                    entry.succeed(msg);
                } else {
                    entry.fail(FailKind::Failed, message);
                }
            }
            None => debug!(%unique, "unmatched command reply"),
        }
    }

    /// Hands the message to every matching handler of every registered
    /// service. Synchronous handlers run inline in registration order;
    /// asynchronous ones are spawned. A handler failure or panic never
    /// aborts dispatch to the remaining handlers.
    async fn dispatch_to_services(self: &Arc<Self>, msg: &Message) {
        // Snapshot the matches so no registry lock is held across awaits.
        let matches: Vec<_> = {
            let services = self.services.read();
            services
                .iter()
                .flat_map(|service| {
                    service
                        .matching_handlers(msg)
                        .into_iter()
                        .map(|handler| (service.clone(), handler))
                })
                .collect()
        };

        let requires_reply = msg.is_command();
        for (service, handler) in matches {
            let ctx = ServiceContext::new(
                self.emitter(service.origin().clone()),
                service.name().to_string(),
                self.config.clone(),
                msg.clone(),
            );
            let span = tracing::info_span!(
                "handler",
                service = %service.name(),
                name = %msg.name(),
                trace = %msg.trace(),
            );
            let fut = (handler.func)(msg.clone(), ctx.clone());
            let name = msg.name();
            if handler.is_async {
                tokio::spawn(
                    async move {
                        run_isolated(fut, name).await;
                        warn_on_missing_reply(requires_reply, &ctx, name);
                    }
                    .instrument(span),
                );
            } else {
                async {
                    run_isolated(fut, name).await;
                    warn_on_missing_reply(requires_reply, &ctx, name);
                }
                .instrument(span)
                .await;
            }
        }
    }

    fn spawn_sweeper(
        pending: Arc<PendingCommands>,
        interval: std::time::Duration,
        shutdown: CancellationToken,
    ) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        for (unique, entry) in pending.take_expired() {
                            warn!(%unique, "pending command expired without a reply");
                            entry.fail(FailKind::Timeout, "command timed out");
                        }
                    }
                }
            }
        });
    }
}

/// Runs one handler future, catching both errors and panics at the dispatch
/// boundary so a misbehaving handler can never take down the bus or starve
/// its siblings.
async fn run_isolated(fut: BoxFuture<'static, anyhow::Result<()>>, message: &'static str) {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(name = message, error = %err, "message handler failed"),
        Err(panic) => {
            error!(name = message, detail = %panic_detail(panic.as_ref()), "message handler panicked");
        }
    }
}

/// Soft contract check: a command handler that finishes without emitting a
/// reply is almost certainly a bug, but it only warrants a warning.
fn warn_on_missing_reply(requires_reply: bool, ctx: &ServiceContext, message: &'static str) {
    if requires_reply && !ctx.reply_emitted() {
        warn!(name = message, service = %ctx.service(), "command handler finished without emitting a reply");
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|detail| (*detail).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
