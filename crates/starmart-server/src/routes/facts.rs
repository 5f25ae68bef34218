//! Fact table routes: sales CRUD plus the per-dimension drilldowns.

use crate::error::ApiError;
use crate::routes::{Pagination, dimensions};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route(
            "/sales/{id}",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
        .route("/sales/by-customer/{id}", get(sales_by_customer))
        .route("/sales/by-product/{id}", get(sales_by_product))
}

async fn list_sales(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Value>>, ApiError> {
    dimensions::list_rows(&state, "fact_sales", page).await
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    dimensions::get_row(&state, "fact_sales", id).await
}

async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    dimensions::create_row(&state, "fact_sales", payload).await
}

async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    dimensions::update_row(&state, "fact_sales", id, patch).await
}

async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    dimensions::delete_row(&state, "fact_sales", id).await
}

async fn sales_by_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Value>>, ApiError> {
    sales_by(&state, "customer_id", id, page).await
}

async fn sales_by_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Value>>, ApiError> {
    sales_by(&state, "product_id", id, page).await
}

async fn sales_by(
    state: &AppState,
    column: &str,
    id: i64,
    page: Pagination,
) -> Result<Json<Vec<Value>>, ApiError> {
    let table = state.registry().get_table("fact_sales").ok_or_else(|| {
        ApiError::Store(starmart_adapter_pg::StoreError::InvalidPayload(
            "no table fact_sales".to_string(),
        ))
    })?;
    Ok(Json(
        state
            .adapter
            .fetch_by_key(table, column, id, page.skip, page.limit)
            .await?,
    ))
}
