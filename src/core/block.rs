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

//! Block hashing, pairwise validity and candidate generation.
//!
//! hash = hex( SHA256( decimal(index) || timestamp || decimal(payload) || prev_hash ) )

use crate::core::types::Block;
use ring::digest;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Why a candidate does not extend its presumed predecessor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejectedBlock {
    /// Candidate index is not predecessor index + 1.
    #[error("index mismatch: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },
    /// Candidate prev_hash does not equal predecessor hash.
    #[error("prev_hash does not link to predecessor")]
    PrevHashMismatch,
    /// Recomputed hash differs from the carried one.
    #[error("hash does not match block contents")]
    HashMismatch,
    /// There is no head to extend.
    #[error("chain has no head")]
    EmptyChain,
}

/// Compute the block digest over (index, timestamp, payload, prev_hash).
///
/// The `hash` field itself is ignored.
pub fn calculate_hash(block: &Block) -> String {
    let record = format!(
        "{}{}{}{}",
        block.index, block.timestamp, block.payload, block.prev_hash
    );
    let d = digest::digest(&digest::SHA256, record.as_bytes());
    hex::encode(d.as_ref())
}

/// Check `candidate` against `predecessor`, reporting the first failing predicate.
pub fn check_block(candidate: &Block, predecessor: &Block) -> Result<(), RejectedBlock> {
    let expected = predecessor.index.wrapping_add(1);
    if candidate.index != expected {
        return Err(RejectedBlock::IndexMismatch {
            expected,
            got: candidate.index,
        });
    }
    if candidate.prev_hash != predecessor.hash {
        return Err(RejectedBlock::PrevHashMismatch);
    }
    if calculate_hash(candidate) != candidate.hash {
        return Err(RejectedBlock::HashMismatch);
    }
    Ok(())
}

/// True iff `candidate` is a valid successor of `predecessor`.
pub fn is_block_valid(candidate: &Block, predecessor: &Block) -> bool {
    check_block(candidate, predecessor).is_ok()
}

/// Build the successor of `predecessor` carrying `payload`, stamped with the current time.
pub fn generate_block(predecessor: &Block, payload: i64) -> Block {
    generate_block_at(predecessor, payload, now_timestamp())
}

/// Same as [`generate_block`] with an explicit timestamp.
pub fn generate_block_at(predecessor: &Block, payload: i64, timestamp: String) -> Block {
    let mut block = Block {
        index: predecessor.index.wrapping_add(1),
        timestamp,
        payload,
        hash: String::new(),
        prev_hash: predecessor.hash.clone(),
    };
    block.hash = calculate_hash(&block);
    block
}

/// Genesis block for a node started now.
///
/// Its hash is taken over the all-default block, so it does not depend on the start time and
/// every node agrees on it.
pub fn genesis() -> Block {
    let hash = calculate_hash(&Block {
        index: 0,
        timestamp: String::new(),
        payload: 0,
        hash: String::new(),
        prev_hash: String::new(),
    });
    Block {
        index: 0,
        timestamp: now_timestamp(),
        payload: 0,
        hash,
        prev_hash: String::new(),
    }
}

/// Current UTC time as RFC 3339.
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
