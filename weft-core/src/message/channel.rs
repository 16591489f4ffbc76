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

use serde::{Deserialize, Serialize};

use crate::common::UnitId;

/// The destination descriptor of a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Channel {
    /// Dispatch only within the current process.
    Local,
    /// Broadcast to all connected components.
    Global,
    /// Deliver to exactly one component.
    Direct {
        /// The addressed component; matched with the instance wildcard rule.
        target: UnitId,
    },
    /// Deliver to a named topic group.
    Room {
        /// The room name.
        room: String,
    },
}

impl Channel {
    /// A local-only channel.
    #[must_use]
    pub const fn local() -> Self {
        Self::Local
    }

    /// A broadcast channel reaching every connected component.
    #[must_use]
    pub const fn global() -> Self {
        Self::Global
    }

    /// A channel addressing one specific component.
    #[must_use]
    pub fn direct(target: UnitId) -> Self {
        Self::Direct { target }
    }

    /// A channel addressing a named room.
    #[must_use]
    pub fn room(room: impl Into<String>) -> Self {
        Self::Room { room: room.into() }
    }

    /// Whether this channel stays within the current process.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// The direct target, when this is a direct channel.
    #[must_use]
    pub const fn direct_target(&self) -> Option<&UnitId> {
        match self {
            Self::Direct { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Global => write!(f, "global"),
            Self::Direct { target } => write!(f, "direct:{target}"),
            Self::Room { room } => write!(f, "room:{room}"),
        }
    }
}
