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

//! Block record and the line-oriented wire encoding of whole chains.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap for one encoded chain on the wire (4 MiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Wire codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization")]
    Serialize,
    #[error("deserialization: {0}")]
    Deserialize(String),
    #[error("size limit exceeded ({len} > {max})")]
    TooLarge { len: usize, max: usize },
    #[error("empty record")]
    Empty,
}

/// One record of the hash-linked chain.
///
/// Wire field names are `index`, `timestamp`, `payload`, `hash` and `prevHash`. The
/// capitalized spellings (`Index`, `BPM`, `PrevHash`, ...) are accepted when decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 = genesis.
    #[serde(rename = "index", alias = "Index")]
    pub index: u64,
    /// Creation time. Carried, never validated.
    #[serde(rename = "timestamp", alias = "Timestamp")]
    pub timestamp: String,
    /// Application measurement carried by the block.
    #[serde(rename = "payload", alias = "BPM", alias = "bpm")]
    pub payload: i64,
    /// Hex SHA-256 of (index, timestamp, payload, prev_hash).
    #[serde(rename = "hash", alias = "Hash")]
    pub hash: String,
    /// Hash of the predecessor; empty only for genesis.
    #[serde(rename = "prevHash", alias = "PrevHash", alias = "prev_hash")]
    pub prev_hash: String,
}

/// Encode a chain as one newline-terminated JSON line.
pub fn encode_chain_line(chain: &[Block]) -> Result<Vec<u8>, CodecError> {
    let mut out = serde_json::to_vec(chain).map_err(|_| CodecError::Serialize)?;
    out.push(b'\n');
    Ok(out)
}

/// Decode one wire record (with or without its trailing newline) with a hard size cap.
pub fn decode_chain_limited(bytes: &[u8], max: usize) -> Result<Vec<Block>, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge {
            len: bytes.len(),
            max,
        });
    }
    let trimmed = trim_line(bytes);
    if trimmed.is_empty() {
        return Err(CodecError::Empty);
    }
    serde_json::from_slice(trimmed).map_err(|e| CodecError::Deserialize(e.to_string()))
}

fn trim_line(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && matches!(bytes[end - 1], b'\n' | b'\r' | b' ' | b'\t') {
        end -= 1;
    }
    let mut start = 0;
    while start < end && matches!(bytes[start], b' ' | b'\t') {
        start += 1;
    }
    &bytes[start..end]
}
