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

//! Local mutation driver: turns application input into blocks on the local chain.

use crate::core::{
    block::{generate_block, RejectedBlock},
    chain::store::ChainStore,
    types::Block,
};
use crate::monitoring::metrics::Metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from parsing a line of local input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("empty input")]
    Empty,
    #[error("not an integer payload: {0:?}")]
    NotInteger(String),
}

/// Parse one line of local input into a payload value.
pub fn parse_payload(line: &str) -> Result<i64, InputError> {
    let s = line.trim();
    if s.is_empty() {
        return Err(InputError::Empty);
    }
    s.parse::<i64>()
        .map_err(|_| InputError::NotInteger(s.to_string()))
}

/// Builds candidate blocks on the current head and applies them to the store.
#[derive(Clone)]
pub struct LocalDriver {
    store: ChainStore,
    metrics: Option<Arc<Metrics>>,
}

impl LocalDriver {
    /// Create a driver over `store`.
    pub fn new(store: ChainStore) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Record appends and rejections in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Append a block carrying `payload` on top of the current head.
    ///
    /// Propagation to peers happens through the replication sessions.
    pub fn submit_payload(&self, payload: i64) -> Result<Block, RejectedBlock> {
        let head = self.store.head().map_err(|_| RejectedBlock::EmptyChain)?;
        let candidate = generate_block(&head, payload);

        // A replacement may land between head() and append; the store rechecks against the
        // head it holds at append time.
        match self.store.append_if_valid(candidate.clone()) {
            Ok(()) => {
                info!(index = candidate.index, payload, hash = %candidate.hash, "block appended");
                if let Some(m) = &self.metrics {
                    m.blocks_appended_total.inc();
                    m.chain_height.set(self.store.len() as i64);
                }
                Ok(candidate)
            }
            Err(e) => {
                warn!(error = %e, payload, "local block rejected");
                if let Some(m) = &self.metrics {
                    m.blocks_rejected_total.inc();
                }
                Err(e)
            }
        }
    }
}
