//! HTTP API for the ingest service
//!
//! Routes:
//! - `POST /attendance/push` — ingest one punch or a batch
//! - `GET /attendance/health` — health/status query
//! - `GET /attendance/events` — SSE subscriber channel

pub mod handlers;
pub mod sse;

use crate::config::RuntimeSettings;
use crate::fanout::Fanout;
use crate::reconcile::Reconciler;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub db: SqlitePool,
    pub fanout: Fanout,
    pub reconciler: Arc<Reconciler>,
    pub settings: RuntimeSettings,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/attendance/push", post(handlers::push))
        .route("/attendance/health", get(handlers::health))
        .route("/attendance/events", get(sse::event_stream))
        .with_state(ctx)
        // Devices and dashboards connect cross-origin
        .layer(CorsLayer::permissive())
}
