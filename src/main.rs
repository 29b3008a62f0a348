#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Pulsechain node entrypoint.
//! Starts the transport, reads integer payloads from stdin and keeps the process alive.

use std::sync::Arc;

use anyhow::Context;
use pulsechain::{
    core::{
        block::genesis,
        chain::{
            driver::{parse_payload, InputError, LocalDriver},
            store::ChainStore,
        },
        config::{LogFormat, NodeConfig},
    },
    monitoring::{
        http::{self, HttpState},
        metrics::Metrics,
    },
    networking::{p2p::spawn_p2p, p2p_identity::node_identity},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .compact()
            .try_init(),
    };
}

fn load_config() -> anyhow::Result<NodeConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PULSE_CONFIG").ok());
    let mut cfg = match path {
        Some(p) => NodeConfig::load(&p).with_context(|| format!("loading config {p}"))?,
        None => NodeConfig::default(),
    };
    cfg.apply_overrides(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

async fn read_local_input(driver: LocalDriver, store: ChainStore) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => {
                info!("stdin closed; local input disabled");
                return;
            }
            Err(e) => {
                warn!(error = %e, "stdin read failed; local input disabled");
                return;
            }
        };

        let payload = match parse_payload(&line) {
            Ok(p) => p,
            Err(InputError::Empty) => continue,
            Err(e) => {
                warn!(error = %e, "ignoring input");
                continue;
            }
        };

        // Rejections are already logged by the driver.
        if driver.submit_payload(payload).is_ok() {
            match serde_json::to_string_pretty(&store.snapshot()) {
                Ok(s) => println!("{s}"),
                Err(e) => warn!(error = %e, "chain display failed"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config()?;
    init_tracing(cfg.node.log_format);

    let (peer_id, _kp) = node_identity(cfg.p2p.identity_seed)?;
    let metrics = Arc::new(Metrics::new()?);
    let store = ChainStore::new(genesis());

    info!(
        name = %cfg.node.name,
        %peer_id,
        genesis = %store.genesis_hash(),
        "pulsechain node starting"
    );

    let (mut node, mut ev_rx) = spawn_p2p(cfg.p2p(), store.clone(), metrics.clone()).await?;
    if let Some(addr) = node.local_addr() {
        info!(
            "connect another node with: PULSE_LISTEN=127.0.0.1:{} PULSE_DIAL={addr} pulsechain",
            addr.port().wrapping_add(1)
        );
    }

    if let Some(addr) = cfg.http.listen_addr.as_deref() {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding http {addr}"))?;
        let state = HttpState {
            store: store.clone(),
            metrics: metrics.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = http::serve(listener, state).await {
                warn!(error = %e, "http server stopped");
            }
        });
    }

    tokio::spawn(async move {
        while let Some(ev) = ev_rx.recv().await {
            info!(?ev, "p2p event");
        }
        warn!("p2p event channel closed");
    });

    let driver = LocalDriver::new(store.clone()).with_metrics(metrics.clone());
    tokio::spawn(read_local_input(driver, store.clone()));

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    node.stop_accepting();
    info!(height = store.len(), "shutting down");
    Ok(())
}
