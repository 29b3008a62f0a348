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

//! Read-only HTTP surface: `GET /health`, `GET /chain`, `GET /metrics`.

use crate::core::{chain::store::ChainStore, types::Block};
use crate::monitoring::metrics::Metrics;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state for the handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Chain to expose.
    pub store: ChainStore,
    /// Metrics to expose.
    pub metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    height: usize,
    head_hash: String,
}

async fn health(State(st): State<HttpState>) -> Json<Health> {
    let chain = st.store.snapshot();
    Json(Health {
        status: "ok",
        height: chain.len(),
        head_hash: chain.last().map(|b| b.hash.clone()).unwrap_or_default(),
    })
}

async fn chain(State(st): State<HttpState>) -> Json<Vec<Block>> {
    Json(st.store.snapshot())
}

async fn metrics(State(st): State<HttpState>) -> Result<String, (StatusCode, String)> {
    st.metrics
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Build the router.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chain", get(chain))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the router on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, state: HttpState) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "http listening");
    axum::serve(listener, router(state)).await
}
