// Copyright (c) 2026 Pulsechain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Node configuration: TOML file plus environment overrides.
//!
//! ```text
//! [node]
//! name = "node1"
//! log_format = "compact"        # or "json"
//!
//! [p2p]
//! listen_addr = "127.0.0.1:4001"
//! dial = "127.0.0.1:4002"       # optional
//! broadcast_interval_ms = 5000
//! max_message_bytes = 4194304
//! identity_seed = 0             # 0 => random identity
//!
//! [http]
//! listen_addr = "127.0.0.1:9090" # optional
//! ```
//!
//! Environment overrides: `PULSE_LISTEN`, `PULSE_DIAL`, `PULSE_SEED`, `PULSE_HTTP`.

use crate::core::types::DEFAULT_MAX_MESSAGE_BYTES;
use crate::networking::{p2p::P2pConfig, session::SessionConfig};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("bad value for {key}: {value:?}")]
    BadEnv { key: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single line.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Node configuration root.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node settings.
    pub node: NodeSettings,
    /// P2P settings.
    pub p2p: NodeP2pConfig,
    /// HTTP endpoints.
    pub http: HttpConfig,
}

/// Node settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Human-readable name.
    pub name: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: "pulsechain".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

/// P2P config embedded in node config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeP2pConfig {
    /// TCP listen address; unset disables inbound peers.
    pub listen_addr: Option<String>,
    /// Peer to dial at startup.
    pub dial: Option<String>,
    /// Period of the unconditional chain broadcast.
    pub broadcast_interval_ms: u64,
    /// Largest accepted wire record.
    pub max_message_bytes: usize,
    /// Identity seed; 0 => random.
    pub identity_seed: u64,
}

impl Default for NodeP2pConfig {
    fn default() -> Self {
        Self {
            listen_addr: None,
            dial: None,
            broadcast_interval_ms: 5_000,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            identity_seed: 0,
        }
    }
}

/// HTTP config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address, e.g. 127.0.0.1:9090; unset disables HTTP.
    pub listen_addr: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl NodeConfig {
    /// Parse TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = non_empty(get("PULSE_LISTEN")) {
            self.p2p.listen_addr = Some(v);
        }
        if let Some(v) = non_empty(get("PULSE_DIAL")) {
            self.p2p.dial = Some(v);
        }
        if let Some(v) = non_empty(get("PULSE_HTTP")) {
            self.http.listen_addr = Some(v);
        }
        if let Some(v) = non_empty(get("PULSE_SEED")) {
            self.p2p.identity_seed = v.trim().parse().map_err(|_| ConfigError::BadEnv {
                key: "PULSE_SEED",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.p2p.broadcast_interval_ms == 0 {
            return Err(ConfigError::Invalid("p2p.broadcast_interval_ms must be > 0"));
        }
        if self.p2p.max_message_bytes == 0 {
            return Err(ConfigError::Invalid("p2p.max_message_bytes must be > 0"));
        }
        if self.p2p.listen_addr.is_none() && self.p2p.dial.is_none() {
            return Err(ConfigError::Invalid(
                "set p2p.listen_addr, p2p.dial, or both",
            ));
        }
        Ok(())
    }

    /// Session tuning derived from the p2p section.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            broadcast_interval: Duration::from_millis(self.p2p.broadcast_interval_ms),
            max_message_bytes: self.p2p.max_message_bytes,
        }
    }

    /// Transport configuration derived from the p2p section.
    pub fn p2p(&self) -> P2pConfig {
        P2pConfig {
            listen_addr: self.p2p.listen_addr.clone(),
            dial: self.p2p.dial.clone(),
            session: self.session(),
        }
    }
}
