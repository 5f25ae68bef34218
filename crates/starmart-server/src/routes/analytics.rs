//! Fixed aggregation routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales-by-category", get(sales_by_category))
        .route("/sales-by-month", get(sales_by_month))
        .route("/top-customers", get(top_customers))
        .route("/top-products", get(top_products))
        .route("/weekend-vs-weekday-sales", get(weekend_vs_weekday))
        .route("/sales-summary", get(sales_summary))
}

#[derive(Debug, Deserialize)]
struct YearParams {
    #[serde(default = "default_year")]
    year: i32,
}

fn default_year() -> i32 {
    2023
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    #[serde(default = "default_top_limit")]
    limit: i64,
}

fn default_top_limit() -> i64 {
    10
}

async fn sales_by_category(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let categories = state.adapter.sales_by_category().await?;
    let total = categories.len();
    Ok(Json(json!({
        "categories": categories,
        "total_categories": total,
    })))
}

async fn sales_by_month(
    State(state): State<AppState>,
    Query(params): Query<YearParams>,
) -> Result<Json<Value>, ApiError> {
    let months = state.adapter.sales_by_month(params.year).await?;
    Ok(Json(json!({
        "year": params.year,
        "months": months,
    })))
}

async fn top_customers(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, ApiError> {
    let customers = state.adapter.top_customers(params.limit).await?;
    Ok(Json(json!({"top_customers": customers})))
}

async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Value>, ApiError> {
    let products = state.adapter.top_products(params.limit).await?;
    Ok(Json(json!({"top_products": products})))
}

async fn weekend_vs_weekday(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let periods = state.adapter.weekend_vs_weekday().await?;
    Ok(Json(json!({"periods": periods})))
}

async fn sales_summary(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let summary = state.adapter.sales_summary().await?;
    Ok(Json(serde_json::to_value(summary).map_err(|e| {
        ApiError::Store(starmart_adapter_pg::StoreError::Query(e.to_string()))
    })?))
}
