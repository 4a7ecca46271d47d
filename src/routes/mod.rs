// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Edge server router: health check plus the guarded front end.

use crate::middleware::edge::edge_guard;
use crate::AppState;
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router. Every request, including static files, goes
/// through the edge guard.
pub fn create_router(state: Arc<AppState>) -> Router {
    let pages = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/health", get(health_check))
        .fallback_service(pages)
        .layer(middleware::from_fn_with_state(state.clone(), edge_guard))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
