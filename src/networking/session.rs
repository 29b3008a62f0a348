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

//! Per-peer replication session.
//!
//! A session owns one duplex stream and runs two duties until the stream fails:
//! - **send**: write the whole local chain as one JSON line on every tick of the broadcast
//!   interval, and immediately whenever the local chain changes;
//! - **receive**: read newline-delimited records, decode each into a candidate chain and offer
//!   it to [`ChainStore::replace_if_better`].
//!
//! Bad records are dropped and the session keeps reading. Only stream failure (EOF or I/O
//! error) ends the session, and it ends both duties at once.

use crate::core::{
    chain::store::{ChainStore, RejectedChain},
    types::{decode_chain_limited, encode_chain_line, CodecError, DEFAULT_MAX_MESSAGE_BYTES},
};
use crate::monitoring::metrics::Metrics;
use std::{io, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Default push-gossip period.
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

/// Why a session ended.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Peer closed the stream.
    #[error("stream closed by peer")]
    Closed,
    /// Read or write failed.
    #[error("stream io: {0}")]
    Io(#[from] io::Error),
    /// The local chain could not be encoded.
    #[error("encode local chain: {0}")]
    Encode(#[from] CodecError),
}

/// Session tuning.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Period of the unconditional broadcast.
    pub broadcast_interval: Duration,
    /// Largest accepted record, delimiter included.
    pub max_message_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: DEFAULT_BROADCAST_INTERVAL,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

/// Result of offering one received record to the store.
#[derive(Debug)]
pub enum Ingest {
    /// Empty line; nothing to do.
    Blank,
    /// The peer's chain replaced ours.
    Adopted {
        /// New local length.
        len: usize,
    },
    /// Decoded but not adopted.
    Rejected(RejectedChain),
    /// Did not decode as a chain.
    Malformed(CodecError),
}

/// Decode one record and offer it to `store`.
pub fn ingest_record(store: &ChainStore, record: &[u8], max: usize) -> Ingest {
    let chain = match decode_chain_limited(record, max) {
        Ok(c) => c,
        Err(CodecError::Empty) => return Ingest::Blank,
        Err(e) => return Ingest::Malformed(e),
    };
    let len = chain.len();
    match store.replace_if_better(chain) {
        Ok(_) => Ingest::Adopted { len },
        Err(e) => Ingest::Rejected(e),
    }
}

enum Record {
    Line,
    Oversized(usize),
    Eof,
}

/// Read one delimited record into `buf`, never buffering more than `max` bytes.
///
/// An oversized record is consumed up to and including its delimiter and reported without
/// its contents.
async fn read_record<R>(rd: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<Record>
where
    R: AsyncBufRead + Unpin,
{
    let limit = max.max(1) as u64;
    let n = (&mut *rd).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Record::Eof);
    }
    if buf.last() == Some(&b'\n') || (buf.len() as u64) < limit {
        // Either a full line, or a final unterminated line before EOF.
        return Ok(Record::Line);
    }

    let mut dropped = buf.len();
    loop {
        buf.clear();
        let n = (&mut *rd).take(limit).read_until(b'\n', buf).await?;
        dropped += n;
        if n == 0 || buf.last() == Some(&b'\n') {
            break;
        }
    }
    buf.clear();
    Ok(Record::Oversized(dropped))
}

/// Replication session over one peer stream.
pub struct ReplicationSession<S> {
    store: ChainStore,
    stream: S,
    peer: String,
    cfg: SessionConfig,
    metrics: Option<Arc<Metrics>>,
}

impl<S> ReplicationSession<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Create a session; `peer` is used for logging only.
    pub fn new(store: ChainStore, stream: S, peer: impl Into<String>, cfg: SessionConfig) -> Self {
        Self {
            store,
            stream,
            peer: peer.into(),
            cfg,
            metrics: None,
        }
    }

    /// Record session activity in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run both duties until the stream fails, returning the reason.
    pub async fn run(self) -> SessionError {
        let Self {
            store,
            stream,
            peer,
            cfg,
            metrics,
        } = self;
        let metrics = metrics.as_deref();

        if let Some(m) = metrics {
            m.p2p_peers.inc();
        }
        info!(peer = %peer, "replication session started");

        let (rd, wr) = tokio::io::split(stream);
        let reader = BufReader::new(rd);

        let reason = tokio::select! {
            e = receive_loop(reader, &store, &peer, cfg.max_message_bytes, metrics) => e,
            e = send_loop(wr, &store, &peer, cfg.broadcast_interval, metrics) => e,
        };

        if let Some(m) = metrics {
            m.p2p_peers.dec();
        }
        info!(peer = %peer, reason = %reason, "replication session ended");
        reason
    }
}

async fn receive_loop<R>(
    mut rd: R,
    store: &ChainStore,
    peer: &str,
    max: usize,
    metrics: Option<&Metrics>,
) -> SessionError
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let outcome = match read_record(&mut rd, &mut buf, max).await {
            Ok(Record::Eof) => return SessionError::Closed,
            Ok(Record::Oversized(len)) => Ingest::Malformed(CodecError::TooLarge { len, max }),
            Ok(Record::Line) => ingest_record(store, &buf, max),
            Err(e) => return SessionError::Io(e),
        };

        match outcome {
            Ingest::Blank => {}
            Ingest::Adopted { len } => {
                info!(peer = %peer, len, "adopted longer chain from peer");
                if let Some(m) = metrics {
                    m.chains_replaced_total.inc();
                    m.chain_height.set(len as i64);
                }
            }
            Ingest::Rejected(RejectedChain::NotLonger { local, remote }) => {
                debug!(peer = %peer, local, remote, "peer chain not longer");
                if let Some(m) = metrics {
                    m.chains_not_longer_total.inc();
                }
            }
            Ingest::Rejected(RejectedChain::InvalidChain(fault)) => {
                warn!(peer = %peer, fault = %fault, "invalid chain from peer");
                if let Some(m) = metrics {
                    m.chains_invalid_total.inc();
                }
            }
            Ingest::Malformed(e) => {
                warn!(peer = %peer, error = %e, "malformed message from peer");
                if let Some(m) = metrics {
                    m.p2p_malformed_msg_total.inc();
                }
            }
        }
    }
}

async fn send_loop<W>(
    mut wr: W,
    store: &ChainStore,
    peer: &str,
    interval: Duration,
    metrics: Option<&Metrics>,
) -> SessionError
where
    W: AsyncWrite + Unpin,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut changes = store.subscribe();
    changes.borrow_and_update();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Ok(()) = changes.changed() => {
                changes.borrow_and_update();
                ticker.reset();
            }
        }

        let chain = store.snapshot();
        let line = match encode_chain_line(&chain) {
            Ok(l) => l,
            Err(e) => return SessionError::Encode(e),
        };
        if let Err(e) = wr.write_all(&line).await {
            return SessionError::Io(e);
        }
        if let Err(e) = wr.flush().await {
            return SessionError::Io(e);
        }
        debug!(peer = %peer, len = chain.len(), "chain broadcast");
        if let Some(m) = metrics {
            m.p2p_broadcasts_total.inc();
        }
    }
}
