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

//! Pulsechain - a hash-linked ledger replicated by whole-chain push gossip.
//!
//! This crate provides:
//! - Blocks with a deterministic SHA-256 digest and a pairwise validity predicate
//! - A shared chain store that only accepts valid extensions or strictly longer valid chains
//! - Per-peer replication sessions over any async duplex stream, plus a TCP transport
//! - Monitoring via Prometheus metrics and structured logging

/// Core protocol primitives (blocks, chain store, config).
pub mod core;
/// Observability (metrics, HTTP surface).
pub mod monitoring;
/// Replication sessions and transport.
pub mod networking;
