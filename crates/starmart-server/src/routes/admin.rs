//! Administrative routes. Not exposed through the tool bridge.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new().route("/seed", post(seed))
}

/// Drop all warehouse rows and regenerate the sample data.
async fn seed(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.adapter.ensure_schema().await?;
    let report = state.adapter.seed(&state.seed).await?;
    tracing::info!(
        customers = report.customers,
        products = report.products,
        dates = report.dates,
        sales = report.sales,
        "sample data reseeded"
    );
    Ok(Json(json!({
        "status": "seeded",
        "report": report,
    })))
}
