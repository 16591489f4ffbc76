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

//! Message types shared across the integration tests.

use weft::prelude::*;

#[weft_message]
pub struct PingCommand {
    pub payload: String,
}

impl TypedPayload for PingCommand {
    const NAME: &'static str = "command/test/ping";
    const FAMILY: MessageFamily = MessageFamily::Command;
}

#[weft_message]
pub struct PingReply {
    pub payload: String,
}

impl TypedPayload for PingReply {
    const NAME: &'static str = "command/test/ping/reply";
    const FAMILY: MessageFamily = MessageFamily::CommandReply;
}

#[weft_message]
pub struct StatusEvent {
    pub status: String,
}

impl TypedPayload for StatusEvent {
    const NAME: &'static str = "event/test/status";
    const FAMILY: MessageFamily = MessageFamily::Event;
}

/// A command type demanding an API key.
#[weft_message]
pub struct GuardedCommand;

impl TypedPayload for GuardedCommand {
    const NAME: &'static str = "command/test/guarded";
    const FAMILY: MessageFamily = MessageFamily::Command;
    const PROTECTED: bool = true;
}

/// Registers every test message type with a component.
pub fn register_test_messages(component: &Component) {
    component
        .register_message_type::<PingCommand>()
        .expect("registering PingCommand");
    component
        .register_message_type::<PingReply>()
        .expect("registering PingReply");
    component
        .register_message_type::<StatusEvent>()
        .expect("registering StatusEvent");
    component
        .register_message_type::<GuardedCommand>()
        .expect("registering GuardedCommand");
}
