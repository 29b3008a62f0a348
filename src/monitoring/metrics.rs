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

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
    #[error("encode")]
    Encode,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Local chain length, genesis included.
    pub chain_height: IntGauge,
    /// Live replication sessions.
    pub p2p_peers: IntGauge,

    /// Blocks appended from local input.
    pub blocks_appended_total: IntCounter,
    /// Local candidates rejected by the store.
    pub blocks_rejected_total: IntCounter,
    /// Peer chains adopted.
    pub chains_replaced_total: IntCounter,
    /// Peer chains failing validation.
    pub chains_invalid_total: IntCounter,
    /// Valid peer chains not longer than ours.
    pub chains_not_longer_total: IntCounter,
    /// Records that did not decode as a chain.
    pub p2p_malformed_msg_total: IntCounter,
    /// Chain snapshots written to peers.
    pub p2p_broadcasts_total: IntCounter,
}

fn gauge(name: &str, help: &str) -> Result<IntGauge, MetricsError> {
    IntGauge::new(name, help).map_err(|_| MetricsError::Prom)
}

fn counter(name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    IntCounter::new(name, help).map_err(|_| MetricsError::Prom)
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let chain_height = gauge("pulsechain_chain_height", "Local chain length")?;
        let p2p_peers = gauge("pulsechain_p2p_peers", "Live replication sessions")?;

        let blocks_appended_total =
            counter("pulsechain_blocks_appended_total", "Blocks appended locally")?;
        let blocks_rejected_total = counter(
            "pulsechain_blocks_rejected_total",
            "Local candidate blocks rejected",
        )?;
        let chains_replaced_total =
            counter("pulsechain_chains_replaced_total", "Peer chains adopted")?;
        let chains_invalid_total =
            counter("pulsechain_chains_invalid_total", "Invalid peer chains")?;
        let chains_not_longer_total = counter(
            "pulsechain_chains_not_longer_total",
            "Valid peer chains not longer than local",
        )?;
        let p2p_malformed_msg_total = counter(
            "pulsechain_p2p_malformed_msg_total",
            "Undecodable peer records",
        )?;
        let p2p_broadcasts_total =
            counter("pulsechain_p2p_broadcasts_total", "Chain snapshots sent")?;

        registry
            .register(Box::new(chain_height.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(p2p_peers.clone()))
            .map_err(|_| MetricsError::Prom)?;
        for c in [
            &blocks_appended_total,
            &blocks_rejected_total,
            &chains_replaced_total,
            &chains_invalid_total,
            &chains_not_longer_total,
            &p2p_malformed_msg_total,
            &p2p_broadcasts_total,
        ] {
            registry
                .register(Box::new(c.clone()))
                .map_err(|_| MetricsError::Prom)?;
        }

        chain_height.set(1);

        Ok(Self {
            registry,
            chain_height,
            p2p_peers,
            blocks_appended_total,
            blocks_rejected_total,
            chains_replaced_total,
            chains_invalid_total,
            chains_not_longer_total,
            p2p_malformed_msg_total,
            p2p_broadcasts_total,
        })
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Encode)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Encode)
    }
}
