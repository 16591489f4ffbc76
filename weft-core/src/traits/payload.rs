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
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The three disjoint message families of the fabric.
///
/// A handler registered for one family never receives a message of another,
/// regardless of name filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFamily {
    /// A request that demands exactly one eventual [`CommandReply`](MessageFamily::CommandReply).
    Command,
    /// The answer to a command, carrying success/failure and a detail string.
    CommandReply,
    /// Fire-and-forget notification with zero or more consumers.
    Event,
}

/// Object-safe view of a message payload, as stored inside a
/// [`Message`](crate::message::Message).
///
/// Implemented automatically for every [`TypedPayload`]; never implement this
/// trait by hand.
pub trait MessagePayload: Any + Send + Sync + Debug {
    /// Upcast for concrete-type downcasting during handler dispatch.
    fn as_any(&self) -> &dyn Any;

    /// Serializes the payload fields to JSON for the wire format.
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// The globally unique hierarchical message name, e.g.
    /// `"command/project/create"`.
    fn name(&self) -> &'static str;

    /// The family this payload belongs to.
    fn family(&self) -> MessageFamily;

    /// Whether messages of this type must carry a valid API key.
    fn protected(&self) -> bool;
}

/// A concrete message payload type.
///
/// Payload types are plain serde structs; the associated constants bind them
/// to a wire name and a family. Types are made known to a component through
/// an explicit [`MessageTypeRegistry::register`](crate::message::MessageTypeRegistry::register)
/// call at startup; there is no registration-by-construction side channel.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use weft_core::traits::{MessageFamily, TypedPayload};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct ProjectCreated {
///     title: String,
/// }
///
/// impl TypedPayload for ProjectCreated {
///     const NAME: &'static str = "event/project/created";
///     const FAMILY: MessageFamily = MessageFamily::Event;
/// }
/// ```
pub trait TypedPayload:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The globally unique hierarchical message name.
    const NAME: &'static str;
    /// The family this payload belongs to.
    const FAMILY: MessageFamily;
    /// Whether messages of this type must carry a valid API key.
    const PROTECTED: bool = false;
}

impl<T: TypedPayload> MessagePayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn family(&self) -> MessageFamily {
        T::FAMILY
    }

    fn protected(&self) -> bool {
        T::PROTECTED
    }
}
