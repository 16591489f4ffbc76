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

//! End-to-end routing verification: dropped messages, name filters, and the
//! local-channel guard against injected wire traffic.

mod setup;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use setup::messages::{register_test_messages, GuardedCommand, PingReply, StatusEvent};
use weft::prelude::*;
use weft::transport::WireMessage;

fn solo_component() -> Component {
    Component::new(
        UnitId::new("test", "solo"),
        ComponentRole::Leaf,
        WeftConfig::default(),
    )
    .expect("component starts")
}

fn counting_service(component: &Component, filter: &str) -> Arc<AtomicUsize> {
    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = deliveries.clone();
    let mut service = component.create_service(format!("listener for {filter}"));
    service.handle_with::<StatusEvent, _, _>(
        filter,
        false,
        move |_: StatusEvent, _msg: Message, _ctx: ServiceContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        },
    );
    component.register_service(service);
    deliveries
}

#[tokio::test]
async fn self_addressed_direct_messages_are_dropped() {
    setup::initialize_tracing();
    let component = solo_component();
    let deliveries = counting_service(&component, StatusEvent::NAME);

    // Direct-to-self from local code is pointless and rejected outright.
    component
        .emitter()
        .event(StatusEvent {
            status: "talking to myself".into(),
        })
        .to(Channel::direct(component.id().clone()))
        .emit()
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(deliveries.load(Ordering::SeqCst), 0);
    component.shutdown();
}

#[tokio::test]
async fn local_channel_frames_off_the_wire_are_dropped() {
    setup::initialize_tracing();
    let component = solo_component();
    register_test_messages(&component);
    let deliveries = counting_service(&component, StatusEvent::NAME);

    // A remote peer claiming a local-channel message: must never reach
    // handlers, no matter how well-formed the frame is.
    let sender = UnitId::new("test", "intruder");
    let frame = WireMessage {
        name: StatusEvent::NAME.to_string(),
        origin: sender.clone(),
        sender: sender.clone(),
        target: Channel::local(),
        hops: vec![sender],
        trace: uuid::Uuid::new_v4(),
        kind: weft::message::MessageKind::Event,
        api_key: None,
        fields: serde_json::json!({ "status": "injected" }),
        bag: Default::default(),
    };
    component.bus().dispatch_wire(frame, Entrypoint::Client).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(deliveries.load(Ordering::SeqCst), 0);
    component.shutdown();
}

#[tokio::test]
async fn name_filters_select_the_listeners() {
    setup::initialize_tracing();
    let component = solo_component();
    let matching = counting_service(&component, "event/test/*");
    let exact = counting_service(&component, StatusEvent::NAME);
    let unrelated = counting_service(&component, "event/other/*");

    component
        .emitter()
        .event(StatusEvent {
            status: "up".into(),
        })
        .emit()
        .await;

    assert_eq!(matching.load(Ordering::SeqCst), 1);
    assert_eq!(exact.load(Ordering::SeqCst), 1);
    assert_eq!(unrelated.load(Ordering::SeqCst), 0);
    component.shutdown();
}

#[tokio::test]
async fn protected_commands_require_the_configured_api_key() {
    setup::initialize_tracing();
    let mut trusted = WeftConfig::default();
    trusted.general.api_key = "sekrit".into();
    let mut rogue_config = WeftConfig::default();
    rogue_config.general.api_key = "not-the-key".into();

    let start = |unit: &str, role, config: &WeftConfig| {
        let component = Component::new(UnitId::new("test", unit), role, config.clone())
            .expect("component starts");
        register_test_messages(&component);
        component
    };
    let hub = start("hub", ComponentRole::Hub, &trusted);
    let leaf = start("leaf", ComponentRole::Leaf, &trusted);
    let rogue = start("rogue", ComponentRole::Leaf, &rogue_config);
    connect(&hub, &leaf).await;
    connect(&hub, &rogue).await;

    let handled = Arc::new(AtomicUsize::new(0));
    let counter = handled.clone();
    let mut service = hub.create_service("guarded service");
    service.handle(move |_: GuardedCommand, _msg: Message, ctx: ServiceContext| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.reply(PingReply { payload: "ok".into() }, true, "")
                .emit()
                .await;
            Ok::<(), anyhow::Error>(())
        }
    });
    hub.register_service(service);

    // The leaf carries the hub's key, so its command goes through.
    let replied = Arc::new(AtomicUsize::new(0));
    let sink = replied.clone();
    leaf.emitter()
        .command(GuardedCommand)
        .to(Channel::direct(hub.id().clone()))
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

    // The rogue's key fails verification at the hub; its command only ever
    // times out.
    let timed_out = Arc::new(AtomicUsize::new(0));
    let sink = timed_out.clone();
    rogue
        .emitter()
        .command(GuardedCommand)
        .to(Channel::direct(hub.id().clone()))
        .failed(move |kind, _detail| {
            assert_eq!(kind, FailKind::Timeout);
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .timeout(Duration::from_millis(100))
        .emit()
        .await;
    assert!(
        setup::wait_until(Duration::from_secs(2), || {
            timed_out.load(Ordering::SeqCst) == 1
        })
        .await
    );
    assert_eq!(handled.load(Ordering::SeqCst), 1);
    leaf.shutdown();
    rogue.shutdown();
    hub.shutdown();
}

#[tokio::test]
async fn instance_wildcards_match_direct_targets() {
    setup::initialize_tracing();
    let component = Component::new(
        UnitId::with_instance("test", "solo", "a1b2"),
        ComponentRole::Leaf,
        WeftConfig::default(),
    )
    .expect("component starts");
    register_test_messages(&component);
    let deliveries = counting_service(&component, StatusEvent::NAME);

    // A frame addressed to test/solo with no instance reaches any instance.
    let sender = UnitId::new("infra", "server");
    let frame = WireMessage {
        name: StatusEvent::NAME.to_string(),
        origin: sender.clone(),
        sender: sender.clone(),
        target: Channel::direct(UnitId::new("test", "solo")),
        hops: vec![sender],
        trace: uuid::Uuid::new_v4(),
        kind: weft::message::MessageKind::Event,
        api_key: None,
        fields: serde_json::json!({ "status": "hello" }),
        bag: Default::default(),
    };
    component.bus().dispatch_wire(frame, Entrypoint::Client).await;

    assert!(
        setup::wait_until(Duration::from_secs(2), || {
            deliveries.load(Ordering::SeqCst) == 1
        })
        .await
    );
    component.shutdown();
}
