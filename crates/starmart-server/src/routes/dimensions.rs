//! Dimension CRUD routes.
//!
//! Customers and products are fully writable. The date spine is
//! generated data and only readable.

use crate::error::ApiError;
use crate::routes::Pagination;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value, json};
use starmart_adapter_pg::StoreError;
use starmart_core::schema::TableDef;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/dates", get(list_dates))
        .route("/dates/{id}", get(get_date))
}

fn table<'a>(state: &'a AppState, name: &str) -> Result<&'a TableDef, ApiError> {
    state
        .registry()
        .get_table(name)
        .ok_or_else(|| ApiError::Store(StoreError::InvalidPayload(format!("no table {name}"))))
}

fn payload_object(payload: Value) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::Store(StoreError::InvalidPayload(
            "request body must be a JSON object".to_string(),
        ))),
    }
}

pub async fn list_rows(
    state: &AppState,
    name: &str,
    page: Pagination,
) -> Result<Json<Vec<Value>>, ApiError> {
    let table = table(state, name)?;
    Ok(Json(state.adapter.fetch_page(table, page.skip, page.limit).await?))
}

pub async fn get_row(state: &AppState, name: &str, id: i64) -> Result<Json<Value>, ApiError> {
    let table = table(state, name)?;
    Ok(Json(state.adapter.fetch_one(table, id).await?))
}

pub async fn create_row(
    state: &AppState,
    name: &str,
    payload: Value,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let table = table(state, name)?;
    let payload = payload_object(payload)?;
    let row = state.adapter.insert(table, &payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_row(
    state: &AppState,
    name: &str,
    id: i64,
    patch: Value,
) -> Result<Json<Value>, ApiError> {
    let table = table(state, name)?;
    let patch = payload_object(patch)?;
    Ok(Json(state.adapter.update(table, id, &patch).await?))
}

pub async fn delete_row(state: &AppState, name: &str, id: i64) -> Result<Json<Value>, ApiError> {
    let table = table(state, name)?;
    state.adapter.delete(table, id).await?;
    Ok(Json(json!({"deleted": id})))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_rows(&state, "dim_customer", page).await
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    get_row(&state, "dim_customer", id).await
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create_row(&state, "dim_customer", payload).await
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    update_row(&state, "dim_customer", id, patch).await
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    delete_row(&state, "dim_customer", id).await
}

async fn list_products(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_rows(&state, "dim_product", page).await
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    get_row(&state, "dim_product", id).await
}

async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create_row(&state, "dim_product", payload).await
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    update_row(&state, "dim_product", id, patch).await
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    delete_row(&state, "dim_product", id).await
}

async fn list_dates(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Value>>, ApiError> {
    list_rows(&state, "dim_date", page).await
}

async fn get_date(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    get_row(&state, "dim_date", id).await
}
