// Copyright (c) 2026 Pulsechain
// Licensed under the Apache License, Version 2.0

//! TCP transport for replication sessions.
//!
//! Accepts inbound peers on an optional listen address and dials an optional target. Every
//! established connection gets its own [`ReplicationSession`] task; a session ending only
//! affects its own peer.

#![forbid(unsafe_code)]

use crate::core::chain::store::ChainStore;
use crate::monitoring::metrics::Metrics;
use crate::networking::session::{ReplicationSession, SessionConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Events emitted by the P2P node.
#[derive(Clone, Debug)]
pub enum P2pEvent {
    /// Session started with peer.
    PeerConnected(String),
    /// Session with peer ended.
    PeerDisconnected {
        /// Peer address.
        peer: String,
        /// Why the session ended.
        reason: String,
    },
}

/// Receiver of P2P events.
pub type EventRx = mpsc::Receiver<P2pEvent>;

#[derive(Debug, Error)]
pub enum P2pError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("dial {addr}: {source}")]
    Dial {
        addr: String,
        source: std::io::Error,
    },
    #[error("config: neither listen address nor dial target set")]
    Config,
}

/// Runtime configuration for the P2P subsystem.
#[derive(Clone, Debug)]
pub struct P2pConfig {
    /// Listen address (e.g. "127.0.0.1:4001"); `None` disables inbound peers.
    pub listen_addr: Option<String>,
    /// Peer to dial at startup.
    pub dial: Option<String>,
    /// Per-session tuning.
    pub session: SessionConfig,
}

/// Handle to the running transport.
pub struct P2pNode {
    local_addr: Option<SocketAddr>,
    accept_task: Option<JoinHandle<()>>,
}

impl P2pNode {
    /// Bound listen address, if listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stop accepting new peers. Running sessions are left alone.
    pub fn stop_accepting(&mut self) {
        if let Some(t) = self.accept_task.take() {
            t.abort();
        }
    }
}

#[derive(Clone)]
struct SessionSpawner {
    store: ChainStore,
    cfg: SessionConfig,
    metrics: Arc<Metrics>,
    ev_tx: mpsc::Sender<P2pEvent>,
}

impl SessionSpawner {
    fn spawn(&self, stream: TcpStream, peer: String) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "set_nodelay failed");
        }
        let session =
            ReplicationSession::new(self.store.clone(), stream, peer.clone(), self.cfg.clone())
                .with_metrics(self.metrics.clone());
        let ev_tx = self.ev_tx.clone();
        // Best-effort: a full event channel drops the event.
        tokio::spawn(async move {
            let _ = ev_tx.try_send(P2pEvent::PeerConnected(peer.clone()));
            let reason = session.run().await;
            let _ = ev_tx.try_send(P2pEvent::PeerDisconnected {
                peer,
                reason: reason.to_string(),
            });
        });
    }
}

/// Start the transport: bind the listener (if any) and dial the target (if any).
pub async fn spawn_p2p(
    cfg: P2pConfig,
    store: ChainStore,
    metrics: Arc<Metrics>,
) -> Result<(P2pNode, EventRx), P2pError> {
    if cfg.listen_addr.is_none() && cfg.dial.is_none() {
        return Err(P2pError::Config);
    }

    let (ev_tx, ev_rx) = mpsc::channel::<P2pEvent>(128);
    let spawner = SessionSpawner {
        store,
        cfg: cfg.session.clone(),
        metrics,
        ev_tx,
    };

    let mut node = P2pNode {
        local_addr: None,
        accept_task: None,
    };

    if let Some(addr) = cfg.listen_addr.as_deref() {
        let listener = TcpListener::bind(addr).await.map_err(|source| P2pError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        node.local_addr = listener.local_addr().ok();
        info!(addr = ?node.local_addr, "listening for peers");
        node.accept_task = Some(tokio::spawn(accept_loop(listener, spawner.clone())));
    }

    if let Some(addr) = cfg.dial.as_deref() {
        let stream = TcpStream::connect(addr).await.map_err(|source| P2pError::Dial {
            addr: addr.to_string(),
            source,
        })?;
        info!(peer = %addr, "dialed peer");
        spawner.spawn(stream, addr.to_string());
    }

    Ok((node, ev_rx))
}

async fn accept_loop(listener: TcpListener, spawner: SessionSpawner) {
    loop {
        match listener.accept().await {
            Ok((stream, remote)) => {
                info!(peer = %remote, "inbound peer");
                spawner.spawn(stream, remote.to_string());
            }
            Err(e) => {
                // Usually fd exhaustion; back off instead of spinning.
                warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
