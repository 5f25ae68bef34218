//! Postgres adapter for the starmart warehouse.
//!
//! Everything that talks to the analytical store lives here: execution
//! of guard-accepted ad-hoc queries, registry-driven entity CRUD, the
//! fixed aggregation queries, and schema bootstrap plus sample-data
//! seeding. Rows are materialised as JSON throughout, via `to_jsonb(t)`
//! where the adapter controls the SQL and a `try_get` fallback chain
//! where it does not.

use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{Arguments, PgPool};
use starmart_core::config::DatabaseConfig;
use starmart_core::schema::{ColumnDef, ColumnType, SchemaRegistry};
use std::sync::Arc;

pub mod analytics;
pub mod entities;
pub mod executor;
pub mod seed;

pub use executor::ResultSet;
pub use seed::SeedReport;

/// Errors surfaced by the adapter.
///
/// `Query` is deliberately distinct from the guard's rejection verdicts:
/// callers can tell "your query text was unsafe" apart from "your query
/// text was safe but the store rejected or failed on it".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not reach or pool the database.
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// The store rejected or failed on a query it was given.
    #[error("query execution failed: {0}")]
    Query(String),

    /// A keyed lookup matched no row.
    #[error("no row with {key} = {id} in {table}")]
    NotFound {
        table: String,
        key: String,
        id: i64,
    },

    /// The caller's payload cannot be mapped onto the table.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

/// Handle on the warehouse database plus the registry snapshot.
///
/// Cloneable and shareable: the pool handles its own concurrency and the
/// registry is read-only, so concurrent calls never contend on adapter
/// state.
#[derive(Clone)]
pub struct WarehouseAdapter {
    pool: PgPool,
    registry: Arc<SchemaRegistry>,
}

impl WarehouseAdapter {
    /// Connect to the warehouse described by `config`.
    pub async fn connect(
        config: &DatabaseConfig,
        registry: Arc<SchemaRegistry>,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(StoreError::Connection)?;
        Ok(Self { pool, registry })
    }

    /// Build an adapter from an existing pool.
    pub fn from_pool(pool: PgPool, registry: Arc<SchemaRegistry>) -> Self {
        Self { pool, registry }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The registry snapshot this adapter serves.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}

/// Quote an identifier for embedding in generated SQL. Identifiers come
/// from the registry, never from user input, so anything outside the
/// `[A-Za-z0-9_]` alphabet is a bug.
pub(crate) fn quote_ident(ident: &str) -> Result<String, StoreError> {
    if ident.is_empty() {
        return Err(StoreError::InvalidPayload("empty identifier".to_string()));
    }
    if !ident
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(StoreError::InvalidPayload(format!(
            "invalid identifier '{ident}'"
        )));
    }
    Ok(format!("\"{ident}\""))
}

pub(crate) fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), StoreError>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v)
        .map_err(|e| StoreError::InvalidPayload(e.to_string()))
}

/// Placeholder cast suffix for types the adapter binds as strings.
pub(crate) fn cast_for(column_type: ColumnType) -> Option<&'static str> {
    match column_type {
        ColumnType::Date => Some("::date"),
        ColumnType::Timestamp => Some("::timestamptz"),
        _ => None,
    }
}

/// Bind a JSON value as the right Postgres type for a registry column.
pub(crate) fn bind_column_value(
    args: &mut PgArguments,
    column: &ColumnDef,
    value: &serde_json::Value,
) -> Result<(), StoreError> {
    if value.is_null() {
        if !column.nullable {
            return Err(StoreError::InvalidPayload(format!(
                "column '{}' is not nullable",
                column.name
            )));
        }
        match column.column_type {
            ColumnType::Integer | ColumnType::BigInt => args_add(args, Option::<i64>::None),
            ColumnType::Float => args_add(args, Option::<f64>::None),
            ColumnType::Boolean => args_add(args, Option::<bool>::None),
            _ => args_add(args, Option::<String>::None),
        }
    } else {
        match column.column_type {
            ColumnType::Integer | ColumnType::BigInt => {
                let n = value.as_i64().ok_or_else(|| {
                    StoreError::InvalidPayload(format!("expected integer for '{}'", column.name))
                })?;
                args_add(args, n)
            }
            ColumnType::Float => {
                let f = value.as_f64().ok_or_else(|| {
                    StoreError::InvalidPayload(format!("expected number for '{}'", column.name))
                })?;
                args_add(args, f)
            }
            ColumnType::Boolean => {
                let b = value.as_bool().ok_or_else(|| {
                    StoreError::InvalidPayload(format!("expected boolean for '{}'", column.name))
                })?;
                args_add(args, b)
            }
            ColumnType::Date | ColumnType::Timestamp => {
                let s = value.as_str().ok_or_else(|| {
                    StoreError::InvalidPayload(format!(
                        "expected date/time string for '{}'",
                        column.name
                    ))
                })?;
                args_add(args, s.to_string())
            }
            ColumnType::Text => {
                let s = value.as_str().ok_or_else(|| {
                    StoreError::InvalidPayload(format!("expected string for '{}'", column.name))
                })?;
                args_add(args, s.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_accepts_registry_names() {
        assert_eq!(quote_ident("dim_customer").unwrap(), "\"dim_customer\"");
        assert_eq!(quote_ident("sale_id").unwrap(), "\"sale_id\"");
    }

    #[test]
    fn quote_ident_rejects_injection_shapes() {
        assert!(quote_ident("").is_err());
        assert!(quote_ident("dim_customer; DROP").is_err());
        assert!(quote_ident("a\"b").is_err());
    }

    #[test]
    fn date_and_timestamp_bind_with_casts() {
        assert_eq!(cast_for(ColumnType::Date), Some("::date"));
        assert_eq!(cast_for(ColumnType::Timestamp), Some("::timestamptz"));
        assert_eq!(cast_for(ColumnType::Integer), None);
        assert_eq!(cast_for(ColumnType::Text), None);
    }

    #[test]
    fn binding_null_into_non_nullable_column_fails() {
        let column = ColumnDef {
            name: "quantity".to_string(),
            column_type: ColumnType::Integer,
            nullable: false,
            primary_key: false,
        };
        let mut args = PgArguments::default();
        let err = bind_column_value(&mut args, &column, &serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn binding_mismatched_json_type_fails() {
        let column = ColumnDef {
            name: "unit_price".to_string(),
            column_type: ColumnType::Float,
            nullable: false,
            primary_key: false,
        };
        let mut args = PgArguments::default();
        let err =
            bind_column_value(&mut args, &column, &serde_json::json!("not a number")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }
}
