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

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for a fabric component.
///
/// Values are loaded from a TOML file, with every field falling back to its
/// typed default, and can be overridden individually through environment
/// variables of the form `WEFT_<SECTION>_<FIELD>` (uppercase), e.g.
/// `WEFT_GENERAL_API_KEY` or `WEFT_TIMEOUTS_COMMAND_TIMEOUT_MS`.
///
/// The configuration is consumed read-only: the router reads the API key, the
/// bus and composers read the timeout defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    /// General component settings.
    pub general: GeneralSettings,
    /// Network and channel capacity settings.
    pub network: NetworkSettings,
    /// Timeout settings.
    pub timeouts: TimeoutSettings,
}

/// General component settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// API key required by protected messages. Empty means no key is
    /// configured and every protected message is rejected.
    pub api_key: String,
}

/// Network and channel capacity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Capacity of the per-connection send queue.
    pub channel_capacity: usize,
}

/// Timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Default reply timeout for commands in milliseconds. Zero disables
    /// expiry for commands that don't set their own timeout.
    pub command_timeout_ms: u64,
    /// Interval of the pending-command expiry sweep in milliseconds.
    pub sweep_interval_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 255,
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            command_timeout_ms: 10_000,
            sweep_interval_ms: 100,
        }
    }
}

impl WeftConfig {
    /// Loads the configuration from a TOML file, falling back to defaults
    /// when the file is missing or malformed, then applies environment
    /// variable overrides.
    ///
    /// A malformed file is logged and ignored rather than aborting startup;
    /// component wiring code that wants hard failures can parse the TOML
    /// itself and construct the struct directly.
    #[must_use]
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let mut config = match path {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<Self>(&contents) {
                    Ok(config) => {
                        debug!(path = %path.display(), "loaded configuration");
                        config
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "malformed configuration, using defaults");
                        Self::default()
                    }
                },
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "no configuration file, using defaults");
                    Self::default()
                }
            },
            None => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    /// The default reply timeout for commands.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.command_timeout_ms)
    }

    /// The pending-command sweep interval.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.timeouts.sweep_interval_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("WEFT_GENERAL_API_KEY") {
            self.general.api_key = value;
        }
        if let Ok(value) = std::env::var("WEFT_NETWORK_CHANNEL_CAPACITY") {
            match value.parse() {
                Ok(parsed) => self.network.channel_capacity = parsed,
                Err(_) => warn!(value, "ignoring non-numeric WEFT_NETWORK_CHANNEL_CAPACITY"),
            }
        }
        if let Ok(value) = std::env::var("WEFT_TIMEOUTS_COMMAND_TIMEOUT_MS") {
            match value.parse() {
                Ok(parsed) => self.timeouts.command_timeout_ms = parsed,
                Err(_) => warn!(value, "ignoring non-numeric WEFT_TIMEOUTS_COMMAND_TIMEOUT_MS"),
            }
        }
        if let Ok(value) = std::env::var("WEFT_TIMEOUTS_SWEEP_INTERVAL_MS") {
            match value.parse() {
                Ok(parsed) => self.timeouts.sweep_interval_ms = parsed,
                Err(_) => warn!(value, "ignoring non-numeric WEFT_TIMEOUTS_SWEEP_INTERVAL_MS"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = WeftConfig::default();
        assert!(config.general.api_key.is_empty());
        assert_eq!(config.command_timeout(), Duration::from_secs(10));
        assert_eq!(config.sweep_interval(), Duration::from_millis(100));
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\ncommand_timeout_ms = 250").unwrap();
        let config = WeftConfig::load_or_default(Some(file.path()));
        assert_eq!(config.timeouts.command_timeout_ms, 250);
        // Untouched sections keep their defaults.
        assert_eq!(config.network.channel_capacity, 255);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = WeftConfig::load_or_default(Some(Path::new("/nonexistent/weft.toml")));
        assert_eq!(config.timeouts.sweep_interval_ms, 100);
    }
}
