//! Execution of guard-accepted ad-hoc queries.
//!
//! The executor runs an already-accepted, limit-bounded query string and
//! materialises a bounded result set. It does not re-validate the text;
//! that is the guard's job. The row cap is still enforced here on the
//! materialised rows, independent of the `LIMIT` clause the guard
//! embedded in the text.

use crate::{StoreError, WarehouseAdapter};
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::{Column, Row};
use starmart_guard::Verdict;

/// A bounded tabular result, owned by the caller that requested it.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    /// Column names in select-list order.
    pub columns: Vec<String>,
    /// One JSON object per row.
    pub rows: Vec<Value>,
    /// Number of rows actually returned.
    pub row_count: usize,
    /// Whether the row cap cut the materialised result short.
    pub truncated: bool,
}

impl WarehouseAdapter {
    /// Execute an accepted verdict's query text and materialise the
    /// rows, truncated to the verdict's effective row limit.
    ///
    /// Engine failures (malformed SQL the lexical filter could not
    /// catch, type mismatches, timeouts) surface as [`StoreError::Query`]
    /// with the engine's message; no rows are returned partially and
    /// nothing is retried.
    pub async fn run_select(&self, verdict: &Verdict) -> Result<ResultSet, StoreError> {
        if !verdict.accepted {
            return Err(StoreError::InvalidPayload(
                "refusing to execute a rejected query".to_string(),
            ));
        }

        tracing::debug!(
            query = %verdict.normalized_text,
            limit = verdict.effective_row_limit,
            "executing ad-hoc query"
        );

        let fetched = sqlx::query(&verdict.normalized_text)
            .fetch_all(self.pool())
            .await?;

        let columns: Vec<String> = fetched
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let limit = verdict.effective_row_limit as usize;
        let truncated = fetched.len() > limit;
        let rows: Vec<Value> = fetched
            .iter()
            .take(limit)
            .map(|row| row_to_json(row))
            .collect();

        let row_count = rows.len();
        Ok(ResultSet {
            columns,
            rows,
            row_count,
            truncated,
        })
    }
}

/// Convert one row of an arbitrary SELECT to a JSON object.
///
/// The column types are whatever the query produced, so each value is
/// decoded through a chain of `try_get` attempts, falling back to null.
pub(crate) fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    let mut obj = serde_json::Map::new();

    for col in row.columns() {
        let name = col.name();

        let value: Value = if let Ok(v) = row.try_get::<i64, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<i32, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<f64, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<bool, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<String, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(name) {
            json!(v.to_string())
        } else if let Ok(v) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(name) {
            json!(v.to_rfc3339())
        } else if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(name) {
            json!(v.to_string())
        } else if let Ok(v) = row.try_get::<Value, _>(name) {
            v
        } else if let Ok(v) = row.try_get::<Option<String>, _>(name) {
            match v {
                Some(s) => json!(s),
                None => Value::Null,
            }
        } else {
            Value::Null
        };

        obj.insert(name.to_string(), value);
    }

    Value::Object(obj)
}
