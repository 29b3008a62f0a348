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
#![deny(missing_docs)]

//! The node's single authoritative chain.
//!
//! All reads and writes go through one mutex held for the whole check-and-mutate step, so
//! every observer sees the result of some completed operation. Replacement is wholesale and
//! follows the longest-valid-chain rule with ties going to the incumbent.

use crate::core::{
    block::{check_block, RejectedBlock},
    types::Block,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

/// The chain holds no blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("chain is empty")]
pub struct EmptyChainError;

/// Structural defect found in a candidate chain.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChainFault {
    /// No blocks at all.
    #[error("empty chain")]
    Empty,
    /// First block is not the genesis this node knows.
    #[error("genesis block does not match")]
    GenesisMismatch,
    /// A block does not extend its predecessor.
    #[error("block at position {position}: {reason}")]
    Block {
        /// Position of the offending block in the candidate.
        position: usize,
        /// Failed predicate.
        reason: RejectedBlock,
    },
}

/// Why a received chain was not adopted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejectedChain {
    /// The candidate fails validation.
    #[error("invalid chain: {0}")]
    InvalidChain(ChainFault),
    /// The candidate is valid but not strictly longer than the local chain.
    #[error("not longer: local {local}, remote {remote}")]
    NotLonger {
        /// Local length at decision time.
        local: usize,
        /// Candidate length.
        remote: usize,
    },
}

/// Validate a whole candidate chain against the local genesis block.
///
/// The first block must match `genesis` in every field except the timestamp, which each node
/// stamps for itself and which the genesis hash does not cover.
pub fn validate_chain(chain: &[Block], genesis: &Block) -> Result<(), ChainFault> {
    let first = chain.first().ok_or(ChainFault::Empty)?;
    if first.index != genesis.index
        || first.payload != genesis.payload
        || first.prev_hash != genesis.prev_hash
        || first.hash != genesis.hash
    {
        return Err(ChainFault::GenesisMismatch);
    }
    for (i, pair) in chain.windows(2).enumerate() {
        check_block(&pair[1], &pair[0]).map_err(|reason| ChainFault::Block {
            position: i + 1,
            reason,
        })?;
    }
    Ok(())
}

struct Inner {
    chain: Mutex<Vec<Block>>,
    genesis: Block,
    height_tx: watch::Sender<usize>,
}

/// Shared handle to the chain. Clones refer to the same chain.
#[derive(Clone)]
pub struct ChainStore {
    inner: Arc<Inner>,
}

impl ChainStore {
    /// Create a store holding only `genesis`.
    pub fn new(genesis: Block) -> Self {
        let (height_tx, _) = watch::channel(1);
        Self {
            inner: Arc::new(Inner {
                chain: Mutex::new(vec![genesis.clone()]),
                genesis,
                height_tx,
            }),
        }
    }

    // Every mutation is a single push or a single swap, so a poisoned guard still holds a
    // complete chain.
    fn lock(&self) -> MutexGuard<'_, Vec<Block>> {
        self.inner
            .chain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hash of the genesis block this store accepts.
    pub fn genesis_hash(&self) -> &str {
        &self.inner.genesis.hash
    }

    /// Genesis block this store was created with.
    pub fn genesis(&self) -> &Block {
        &self.inner.genesis
    }

    /// Last block.
    pub fn head(&self) -> Result<Block, EmptyChainError> {
        self.lock().last().cloned().ok_or(EmptyChainError)
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if the store holds no blocks. Never the case after construction.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Consistent copy of the whole chain.
    pub fn snapshot(&self) -> Vec<Block> {
        self.lock().clone()
    }

    /// Watch the chain length; a new value is published after every successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.inner.height_tx.subscribe()
    }

    /// Append `candidate` if it is a valid successor of the current head.
    pub fn append_if_valid(&self, candidate: Block) -> Result<(), RejectedBlock> {
        let mut chain = self.lock();
        let head = chain.last().ok_or(RejectedBlock::EmptyChain)?;
        check_block(&candidate, head)?;
        chain.push(candidate);
        self.inner.height_tx.send_replace(chain.len());
        Ok(())
    }

    /// Adopt `candidate` if it is valid and strictly longer than the local chain.
    ///
    /// Returns `Ok(true)` when the local chain was replaced.
    pub fn replace_if_better(&self, candidate: Vec<Block>) -> Result<bool, RejectedChain> {
        // Validation only reads the candidate and the immutable genesis.
        validate_chain(&candidate, &self.inner.genesis)
            .map_err(RejectedChain::InvalidChain)?;

        let mut chain = self.lock();
        if candidate.len() <= chain.len() {
            return Err(RejectedChain::NotLonger {
                local: chain.len(),
                remote: candidate.len(),
            });
        }
        *chain = candidate;
        self.inner.height_tx.send_replace(chain.len());
        Ok(true)
    }
}

impl std::fmt::Debug for ChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainStore")
            .field("len", &self.len())
            .field("genesis_hash", &self.inner.genesis.hash)
            .finish()
    }
}
