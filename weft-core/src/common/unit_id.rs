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
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A three-part hierarchical component identifier.
///
/// A `UnitId` names a component of the platform: a *type* (e.g. `infra`), a
/// *unit* within that type (e.g. `server`), and an optional *instance*
/// discriminator for components that run more than once (e.g.
/// `infra/connector/1`).
///
/// The instance part acts as a wildcard for routing: see [`UnitId::matches`].
///
/// # Example
///
/// ```rust
/// use weft_core::common::UnitId;
///
/// let server: UnitId = "infra/server".parse().unwrap();
/// let instance = server.instanced("a");
/// assert!(server.matches(&instance));
/// assert_eq!(instance.to_string(), "infra/server/a");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnitId {
    unit_type: String,
    unit: String,
    instance: Option<String>,
}

/// Error returned when parsing a [`UnitId`] from its string form fails.
#[derive(Debug, Error)]
#[error("invalid unit id {value:?}: expected \"type/unit\" or \"type/unit/instance\"")]
pub struct UnitIdParseError {
    value: String,
}

impl UnitId {
    /// Creates an identifier without an instance part.
    pub fn new(unit_type: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            unit_type: unit_type.into(),
            unit: unit.into(),
            instance: None,
        }
    }

    /// Creates an identifier with all three parts.
    pub fn with_instance(
        unit_type: impl Into<String>,
        unit: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            unit_type: unit_type.into(),
            unit: unit.into(),
            instance: Some(instance.into()),
        }
    }

    /// Returns a clone of this identifier carrying the given instance part.
    #[must_use]
    pub fn instanced(&self, instance: impl Into<String>) -> Self {
        Self {
            unit_type: self.unit_type.clone(),
            unit: self.unit.clone(),
            instance: Some(instance.into()),
        }
    }

    /// The type part of the identifier.
    #[must_use]
    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// The unit part of the identifier.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The optional instance part of the identifier.
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Routing equality with instance wildcarding.
    ///
    /// Two identifiers match when type and unit are equal and either side's
    /// instance is unset, or both instances are equal. An unset instance thus
    /// acts as a wildcard on *either* side. This rule is the basis of every
    /// "is this message meant for me" check in the routers and must not be
    /// confused with [`PartialEq`], which compares all three parts strictly.
    #[must_use]
    pub fn matches(&self, other: &UnitId) -> bool {
        if self.unit_type != other.unit_type || self.unit != other.unit {
            return false;
        }
        match (&self.instance, &other.instance) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}/{}/{}", self.unit_type, self.unit, instance),
            None => write!(f, "{}/{}", self.unit_type, self.unit),
        }
    }
}

impl FromStr for UnitId {
    type Err = UnitIdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split('/').collect();
        let invalid = || UnitIdParseError {
            value: value.to_string(),
        };
        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [unit_type, unit] => Ok(Self::new(*unit_type, *unit)),
            [unit_type, unit, instance] => Ok(Self::with_instance(*unit_type, *unit, *instance)),
            _ => Err(invalid()),
        }
    }
}

/// Serialized as the `"type/unit[/instance]"` string form used on the wire.
impl Serialize for UnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_instance_matches_either_way() {
        let bare = UnitId::new("infra", "server");
        let instanced = UnitId::with_instance("infra", "server", "a");
        assert!(bare.matches(&instanced));
        assert!(instanced.matches(&bare));
    }

    #[test]
    fn differing_instances_do_not_match() {
        let a = UnitId::with_instance("infra", "server", "a");
        let b = UnitId::with_instance("infra", "server", "b");
        assert!(!a.matches(&b));
    }

    #[test]
    fn differing_units_do_not_match() {
        let server = UnitId::new("infra", "server");
        let gate = UnitId::new("infra", "gate");
        assert!(!server.matches(&gate));
    }

    #[test]
    fn parse_round_trip() {
        for text in ["infra/server", "infra/connector/1"] {
            let id: UnitId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("infra".parse::<UnitId>().is_err());
        assert!("infra//x".parse::<UnitId>().is_err());
        assert!("a/b/c/d".parse::<UnitId>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let id = UnitId::with_instance("infra", "connector", "osf");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"infra/connector/osf\"");
        let back: UnitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
