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

//! Cross-component messaging over the in-process transport: direct
//! command/reply between a leaf and its hub, and hub fan-out without echo.

mod setup;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use setup::messages::{register_test_messages, PingCommand, PingReply, StatusEvent};
use weft::prelude::*;

fn start(unit: &str, role: ComponentRole) -> Component {
    let component = Component::new(
        UnitId::with_instance("test", unit, "1"),
        role,
        WeftConfig::default(),
    )
    .expect("component starts");
    register_test_messages(&component);
    component
}

#[tokio::test]
async fn leaf_commands_the_hub_and_gets_its_reply() {
    setup::initialize_tracing();
    let hub = start("hub", ComponentRole::Hub);
    let leaf = start("leaf", ComponentRole::Leaf);
    connect(&hub, &leaf).await;

    let mut service = hub.create_service("ping service");
    service.handle(
        |cmd: PingCommand, _msg: Message, ctx: ServiceContext| async move {
            ctx.reply(
                PingReply {
                    payload: format!("{} PONG", cmd.payload),
                },
                true,
                "",
            )
            .emit()
            .await;
            Ok::<(), anyhow::Error>(())
        },
    );
    hub.register_service(service);

    let received = Arc::new(Mutex::new(String::new()));
    let sink = received.clone();
    leaf.emitter()
        .command(PingCommand {
            payload: "PING".into(),
        })
        .to(Channel::direct(hub.id().clone()))
        .done(move |reply: Message| {
            let payload = reply
                .body_as::<PingReply>()
                .expect("reply carries a PingReply")
                .payload
                .clone();
            *sink.lock().unwrap() = payload;
        })
        .emit()
        .await;

    assert!(
        setup::wait_until(Duration::from_secs(2), || {
            !received.lock().unwrap().is_empty()
        })
        .await
    );
    assert_eq!(*received.lock().unwrap(), "PING PONG");
    assert_eq!(leaf.bus().pending_count(), 0);
    leaf.shutdown();
    hub.shutdown();
}

#[tokio::test]
async fn global_events_fan_out_without_echoing_to_the_sender() {
    setup::initialize_tracing();
    let hub = start("hub", ComponentRole::Hub);
    let leaf_x = start("leaf-x", ComponentRole::Leaf);
    let leaf_y = start("leaf-y", ComponentRole::Leaf);
    connect(&hub, &leaf_x).await;
    connect(&hub, &leaf_y).await;

    let listen = |component: &Component| {
        let deliveries = Arc::new(AtomicUsize::new(0));
        let counter = deliveries.clone();
        let mut service = component.create_service("status listener");
        service.handle(move |_: StatusEvent, _msg: Message, _ctx: ServiceContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        });
        component.register_service(service);
        deliveries
    };
    let on_hub = listen(&hub);
    let on_x = listen(&leaf_x);
    let on_y = listen(&leaf_y);

    leaf_x
        .emitter()
        .event(StatusEvent {
            status: "up".into(),
        })
        .to(Channel::global())
        .emit()
        .await;

    assert!(
        setup::wait_until(Duration::from_secs(2), || {
            on_hub.load(Ordering::SeqCst) == 1 && on_y.load(Ordering::SeqCst) == 1
        })
        .await
    );
    // No echo: X sees only its own local delivery.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(on_x.load(Ordering::SeqCst), 1);
    assert_eq!(on_hub.load(Ordering::SeqCst), 1);
    assert_eq!(on_y.load(Ordering::SeqCst), 1);
    leaf_x.shutdown();
    leaf_y.shutdown();
    hub.shutdown();
}

#[tokio::test]
async fn direct_command_terminates_at_the_node_and_is_handled_once() {
    setup::initialize_tracing();
    let hub = start("hub", ComponentRole::Hub);
    let node = start("gate", ComponentRole::Node);
    let leaf = start("leaf", ComponentRole::Leaf);
    connect(&hub, &node).await;
    connect(&node, &leaf).await;

    let handled = Arc::new(AtomicUsize::new(0));
    let counter = handled.clone();
    let mut service = node.create_service("ping service");
    service.handle(move |cmd: PingCommand, _msg: Message, ctx: ServiceContext| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.reply(
                PingReply {
                    payload: format!("{} PONG", cmd.payload),
                },
                true,
                "",
            )
            .emit()
            .await;
            Ok::<(), anyhow::Error>(())
        }
    });
    node.register_service(service);

    let replied = Arc::new(AtomicUsize::new(0));
    let sink = replied.clone();
    leaf.emitter()
        .command(PingCommand {
            payload: "PING".into(),
        })
        .to(Channel::direct(node.id().clone()))
        .done(move |_reply: Message| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .emit()
        .await;

    assert!(
        setup::wait_until(Duration::from_secs(2), || {
            replied.load(Ordering::SeqCst) == 1
        })
        .await
    );
    // Leave time for a stray relayed copy to come back around the hub.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handled.load(Ordering::SeqCst), 1);
    assert_eq!(leaf.bus().pending_count(), 0);
    leaf.shutdown();
    node.shutdown();
    hub.shutdown();
}

#[tokio::test]
async fn global_events_cross_the_node_tier_once_per_component() {
    setup::initialize_tracing();
    let hub = start("hub", ComponentRole::Hub);
    let node = start("gate", ComponentRole::Node);
    let leaf = start("leaf", ComponentRole::Leaf);
    connect(&hub, &node).await;
    connect(&node, &leaf).await;

    let listen = |component: &Component| {
        let deliveries = Arc::new(AtomicUsize::new(0));
        let counter = deliveries.clone();
        let mut service = component.create_service("status listener");
        service.handle(move |_: StatusEvent, _msg: Message, _ctx: ServiceContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        });
        component.register_service(service);
        deliveries
    };
    let on_hub = listen(&hub);
    let on_node = listen(&node);
    let on_leaf = listen(&leaf);

    leaf.emitter()
        .event(StatusEvent {
            status: "up".into(),
        })
        .to(Channel::global())
        .emit()
        .await;

    assert!(
        setup::wait_until(Duration::from_secs(2), || {
            on_hub.load(Ordering::SeqCst) == 1 && on_node.load(Ordering::SeqCst) == 1
        })
        .await
    );
    // The hub must skip the node link it heard the event from, or the node
    // tier handles everything twice.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(on_leaf.load(Ordering::SeqCst), 1);
    assert_eq!(on_node.load(Ordering::SeqCst), 1);
    assert_eq!(on_hub.load(Ordering::SeqCst), 1);
    leaf.shutdown();
    node.shutdown();
    hub.shutdown();
}

#[tokio::test]
async fn connection_events_announce_attachments() {
    setup::initialize_tracing();
    let hub = start("hub", ComponentRole::Hub);
    let leaf = start("leaf", ComponentRole::Leaf);

    let connected = Arc::new(Mutex::new(None));
    let sink = connected.clone();
    let mut service = hub.create_service("connection watcher");
    service.handle(
        move |event: ClientConnectedEvent, _msg: Message, _ctx: ServiceContext| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(event.client);
                Ok::<(), anyhow::Error>(())
            }
        },
    );
    hub.register_service(service);

    connect(&hub, &leaf).await;

    assert!(
        setup::wait_until(Duration::from_secs(2), || connected.lock().unwrap().is_some()).await
    );
    assert_eq!(connected.lock().unwrap().clone().unwrap(), *leaf.id());
    leaf.shutdown();
    hub.shutdown();
}
