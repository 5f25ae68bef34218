//! Route wiring.

pub mod admin;
pub mod analytics;
pub mod dimensions;
pub mod facts;
pub mod sql;

use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

/// Pagination query parameters shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

fn default_page_limit() -> i64 {
    100
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1/dimensions", dimensions::router())
        .nest("/api/v1/facts", facts::router())
        .nest("/api/v1/analytics", analytics::router())
        .nest("/api/v1/sql", sql::router())
        .nest("/api/v1/admin", admin::router())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "starmart",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/v1",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}
