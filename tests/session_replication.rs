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

use pulsechain::core::block::{generate_block_at, genesis};
use pulsechain::core::chain::driver::LocalDriver;
use pulsechain::core::chain::store::ChainStore;
use pulsechain::core::types::{decode_chain_limited, encode_chain_line, Block};
use pulsechain::monitoring::metrics::Metrics;
use pulsechain::networking::session::{ReplicationSession, SessionConfig, SessionError};
use std::{sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn cfg(interval_ms: u64, max: usize) -> SessionConfig {
    SessionConfig {
        broadcast_interval: Duration::from_millis(interval_ms),
        max_message_bytes: max,
    }
}

fn extend(base: &[Block], payloads: &[i64]) -> Vec<Block> {
    let mut chain = base.to_vec();
    for (i, p) in payloads.iter().enumerate() {
        let prev = chain.last().cloned().unwrap();
        chain.push(generate_block_at(&prev, *p, format!("remote-{i}")));
    }
    chain
}

async fn wait_for_len(store: &ChainStore, len: usize) {
    timeout(WAIT, async {
        while store.len() < len {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("store did not reach expected length");
}

#[tokio::test]
async fn broadcasts_local_chain_on_connect() {
    let store = ChainStore::new(genesis());
    LocalDriver::new(store.clone()).submit_payload(61).unwrap();

    let (local, remote) = tokio::io::duplex(1 << 16);
    let session = ReplicationSession::new(store.clone(), local, "peer", cfg(60_000, 1 << 20));
    let task = tokio::spawn(session.run());

    let mut lines = BufReader::new(remote).lines();
    let line = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
    let chain = decode_chain_limited(line.as_bytes(), 1 << 20).unwrap();
    assert_eq!(chain, store.snapshot());

    task.abort();
}

#[tokio::test]
async fn periodic_broadcast_repeats_unchanged_chain() {
    let store = ChainStore::new(genesis());
    let (local, remote) = tokio::io::duplex(1 << 16);
    let task = tokio::spawn(
        ReplicationSession::new(store.clone(), local, "peer", cfg(20, 1 << 20)).run(),
    );

    let mut lines = BufReader::new(remote).lines();
    for _ in 0..3 {
        let line = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
        assert_eq!(decode_chain_limited(line.as_bytes(), 1 << 20).unwrap().len(), 1);
    }
    task.abort();
}

#[tokio::test]
async fn local_append_triggers_immediate_broadcast() {
    let store = ChainStore::new(genesis());
    let (local, remote) = tokio::io::duplex(1 << 16);
    let task = tokio::spawn(
        ReplicationSession::new(store.clone(), local, "peer", cfg(3_600_000, 1 << 20)).run(),
    );

    let mut lines = BufReader::new(remote).lines();
    let first = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
    assert_eq!(decode_chain_limited(first.as_bytes(), 1 << 20).unwrap().len(), 1);

    LocalDriver::new(store.clone()).submit_payload(99).unwrap();
    let second = timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
    let chain = decode_chain_limited(second.as_bytes(), 1 << 20).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].payload, 99);

    task.abort();
}

#[tokio::test]
async fn receiver_survives_bad_records_then_adopts() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let store = ChainStore::new(genesis());
    let (local, remote) = tokio::io::duplex(1 << 16);
    let session = ReplicationSession::new(store.clone(), local, "peer", cfg(60_000, 1024))
        .with_metrics(metrics.clone());
    let task = tokio::spawn(session.run());

    let (rd, mut wr) = tokio::io::split(remote);
    // Keep draining our side so the session's writes never block.
    let drain = tokio::spawn(async move {
        let mut lines = BufReader::new(rd).lines();
        while let Ok(Some(_)) = lines.next_line().await {}
    });

    let mut tampered = extend(&store.snapshot(), &[1, 2]);
    tampered[1].payload += 1;
    let good = extend(&store.snapshot(), &[3, 4]);

    wr.write_all(b"this is not json\n").await.unwrap();
    wr.write_all(b"\n").await.unwrap();
    wr.write_all(&vec![b'x'; 5000]).await.unwrap();
    wr.write_all(b"\n").await.unwrap();
    wr.write_all(&encode_chain_line(&tampered).unwrap()).await.unwrap();
    wr.write_all(&encode_chain_line(&good).unwrap()).await.unwrap();
    wr.flush().await.unwrap();

    wait_for_len(&store, 3).await;
    assert_eq!(store.snapshot(), good);
    assert!(!task.is_finished());
    assert_eq!(metrics.p2p_malformed_msg_total.get(), 2);
    assert_eq!(metrics.chains_invalid_total.get(), 1);
    assert_eq!(metrics.chains_replaced_total.get(), 1);
    assert_eq!(metrics.p2p_peers.get(), 1);

    task.abort();
    drain.abort();
}

#[tokio::test]
async fn session_ends_when_peer_closes() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let store = ChainStore::new(genesis());
    let (local, remote) = tokio::io::duplex(1 << 16);
    let task = tokio::spawn(
        ReplicationSession::new(store.clone(), local, "peer", cfg(10, 1 << 20))
            .with_metrics(metrics.clone())
            .run(),
    );

    drop(remote);
    let reason = timeout(WAIT, task).await.unwrap().unwrap();
    assert!(
        matches!(reason, SessionError::Closed | SessionError::Io(_)),
        "unexpected reason {reason:?}"
    );
    assert_eq!(metrics.p2p_peers.get(), 0);
    // Store untouched and still usable.
    assert_eq!(store.len(), 1);
    LocalDriver::new(store.clone()).submit_payload(1).unwrap();
}

#[tokio::test]
async fn two_sessions_converge_to_longer_chain() {
    let g = genesis();
    let a = ChainStore::new(g.clone());
    let b = ChainStore::new(g);
    let driver_a = LocalDriver::new(a.clone());
    for p in [70, 71, 72] {
        driver_a.submit_payload(p).unwrap();
    }
    LocalDriver::new(b.clone()).submit_payload(80).unwrap();

    let (end_a, end_b) = tokio::io::duplex(1 << 16);
    let ta = tokio::spawn(
        ReplicationSession::new(a.clone(), end_a, "b", cfg(20, 1 << 20)).run(),
    );
    let tb = tokio::spawn(
        ReplicationSession::new(b.clone(), end_b, "a", cfg(20, 1 << 20)).run(),
    );

    wait_for_len(&b, 4).await;
    assert_eq!(b.snapshot(), a.snapshot());

    // Let a few more rounds pass; A keeps its chain since B's echo is only as long.
    sleep(Duration::from_millis(100)).await;
    assert_eq!(a.len(), 4);
    assert_eq!(b.snapshot(), a.snapshot());

    ta.abort();
    tb.abort();
}

#[tokio::test]
async fn one_session_ending_leaves_others_running() {
    let store = ChainStore::new(genesis());
    let (l1, r1) = tokio::io::duplex(1 << 16);
    let (l2, r2) = tokio::io::duplex(1 << 16);
    let t1 = tokio::spawn(
        ReplicationSession::new(store.clone(), l1, "p1", cfg(20, 1 << 20)).run(),
    );
    let t2 = tokio::spawn(
        ReplicationSession::new(store.clone(), l2, "p2", cfg(20, 1 << 20)).run(),
    );

    drop(r1);
    timeout(WAIT, t1).await.unwrap().unwrap();

    let mut lines = BufReader::new(r2).lines();
    for _ in 0..2 {
        timeout(WAIT, lines.next_line()).await.unwrap().unwrap().unwrap();
    }
    assert!(!t2.is_finished());
    t2.abort();
}
