//! Registry-driven entity CRUD.
//!
//! The dimension and fact tables share one access path: the registry's
//! `TableDef` supplies the identifiers, payload keys are filtered
//! against it, and values are bound as typed parameters. Generated SQL
//! only ever embeds quoted registry identifiers.

use crate::{StoreError, WarehouseAdapter, bind_column_value, cast_for, quote_ident};
use serde_json::{Map, Value};
use sqlx::Row;
use sqlx::postgres::PgArguments;
use starmart_core::schema::TableDef;

impl WarehouseAdapter {
    /// Fetch a page of rows ordered by primary key.
    pub async fn fetch_page(
        &self,
        table: &TableDef,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError> {
        let table_ident = quote_ident(&table.name)?;
        let pk = quote_ident(&table.primary_key().name)?;
        let sql = format!(
            "SELECT to_jsonb(t) AS row FROM {table_ident} AS t ORDER BY {pk} OFFSET $1 LIMIT $2"
        );

        let recs = sqlx::query(&sql)
            .bind(skip.max(0))
            .bind(limit.max(0))
            .fetch_all(self.pool())
            .await?;

        let mut rows = Vec::with_capacity(recs.len());
        for rec in recs {
            rows.push(rec.try_get::<Value, _>("row")?);
        }
        Ok(rows)
    }

    /// Fetch a single row by primary key.
    pub async fn fetch_one(&self, table: &TableDef, id: i64) -> Result<Value, StoreError> {
        let table_ident = quote_ident(&table.name)?;
        let pk = table.primary_key();
        let pk_ident = quote_ident(&pk.name)?;
        let sql = format!(
            "SELECT to_jsonb(t) AS row FROM {table_ident} AS t WHERE {pk_ident} = $1 LIMIT 1"
        );

        let rec = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match rec {
            Some(rec) => Ok(rec.try_get::<Value, _>("row")?),
            None => Err(StoreError::NotFound {
                table: table.name.clone(),
                key: pk.name.clone(),
                id,
            }),
        }
    }

    /// Fetch a page of rows where an integer column (typically a
    /// foreign key into a dimension) equals `id`, ordered by primary
    /// key.
    pub async fn fetch_by_key(
        &self,
        table: &TableDef,
        column: &str,
        id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Value>, StoreError> {
        let column = table.column(column).ok_or_else(|| {
            StoreError::InvalidPayload(format!("no column {column} in {}", table.name))
        })?;
        let table_ident = quote_ident(&table.name)?;
        let pk = quote_ident(&table.primary_key().name)?;
        let column_ident = quote_ident(&column.name)?;
        let sql = format!(
            "SELECT to_jsonb(t) AS row FROM {table_ident} AS t WHERE {column_ident} = $1 \
             ORDER BY {pk} OFFSET $2 LIMIT $3"
        );

        let recs = sqlx::query(&sql)
            .bind(id)
            .bind(skip.max(0))
            .bind(limit.max(0))
            .fetch_all(self.pool())
            .await?;

        let mut rows = Vec::with_capacity(recs.len());
        for rec in recs {
            rows.push(rec.try_get::<Value, _>("row")?);
        }
        Ok(rows)
    }

    /// Insert a row, assigning the next primary key as max(pk)+1, and
    /// return the created row.
    ///
    /// Payload keys must all be registry columns of this table; the
    /// primary key may not be supplied.
    pub async fn insert(
        &self,
        table: &TableDef,
        payload: &Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let pk = table.primary_key();
        let pairs = payload_pairs(table, payload, pk)?;
        if pairs.is_empty() {
            return Err(StoreError::InvalidPayload(
                "payload contains no insertable columns".to_string(),
            ));
        }

        let table_ident = quote_ident(&table.name)?;
        let pk_ident = quote_ident(&pk.name)?;

        let mut columns = vec![pk_ident.clone()];
        let mut values = vec![format!(
            "(SELECT COALESCE(MAX({pk_ident}), 0) + 1 FROM {table_ident})"
        )];
        let mut args = PgArguments::default();
        for (idx, (column, value)) in pairs.iter().enumerate() {
            columns.push(quote_ident(&column.name)?);
            let cast = cast_for(column.column_type).unwrap_or_default();
            values.push(format!("${}{}", idx + 1, cast));
            bind_column_value(&mut args, column, value)?;
        }

        let sql = format!(
            "INSERT INTO {table_ident} AS t ({}) VALUES ({}) RETURNING to_jsonb(t) AS row",
            columns.join(", "),
            values.join(", ")
        );

        let rec = sqlx::query_with(&sql, args).fetch_one(self.pool()).await?;
        Ok(rec.try_get::<Value, _>("row")?)
    }

    /// Apply a partial patch to a row identified by primary key and
    /// return the updated row.
    pub async fn update(
        &self,
        table: &TableDef,
        id: i64,
        patch: &Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let pk = table.primary_key();
        let pairs = payload_pairs(table, patch, pk)?;
        if pairs.is_empty() {
            return Err(StoreError::InvalidPayload(
                "patch contains no updatable columns".to_string(),
            ));
        }

        let table_ident = quote_ident(&table.name)?;
        let pk_ident = quote_ident(&pk.name)?;

        let mut set_parts = Vec::with_capacity(pairs.len());
        let mut args = PgArguments::default();
        for (idx, (column, value)) in pairs.iter().enumerate() {
            let cast = cast_for(column.column_type).unwrap_or_default();
            set_parts.push(format!(
                "{} = ${}{}",
                quote_ident(&column.name)?,
                idx + 1,
                cast
            ));
            bind_column_value(&mut args, column, value)?;
        }
        crate::args_add(&mut args, id)?;
        let pk_placeholder = pairs.len() + 1;

        let sql = format!(
            "UPDATE {table_ident} AS t SET {} WHERE {pk_ident} = ${pk_placeholder} \
             RETURNING to_jsonb(t) AS row",
            set_parts.join(", ")
        );

        let rec = sqlx::query_with(&sql, args)
            .fetch_optional(self.pool())
            .await?;
        match rec {
            Some(rec) => Ok(rec.try_get::<Value, _>("row")?),
            None => Err(StoreError::NotFound {
                table: table.name.clone(),
                key: pk.name.clone(),
                id,
            }),
        }
    }

    /// Delete a row by primary key.
    pub async fn delete(&self, table: &TableDef, id: i64) -> Result<(), StoreError> {
        let table_ident = quote_ident(&table.name)?;
        let pk = table.primary_key();
        let pk_ident = quote_ident(&pk.name)?;
        let sql = format!("DELETE FROM {table_ident} WHERE {pk_ident} = $1");

        let result = sqlx::query(&sql).bind(id).execute(self.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table: table.name.clone(),
                key: pk.name.clone(),
                id,
            });
        }
        Ok(())
    }

}

/// Resolve payload keys to registry columns, in sorted key order.
/// Unknown keys and the primary key are rejected outright rather than
/// silently dropped. Pure lookup against the `TableDef`; no database.
fn payload_pairs<'a>(
    table: &'a TableDef,
    payload: &'a Map<String, Value>,
    pk: &starmart_core::schema::ColumnDef,
) -> Result<Vec<(&'a starmart_core::schema::ColumnDef, &'a Value)>, StoreError> {
    let mut pairs = Vec::with_capacity(payload.len());
    for (key, value) in payload {
        if key == &pk.name {
            return Err(StoreError::InvalidPayload(format!(
                "primary key '{}' is assigned by the warehouse and cannot be supplied",
                pk.name
            )));
        }
        let column = table.column(key).ok_or_else(|| {
            StoreError::InvalidPayload(format!(
                "unknown column '{}' for table '{}'",
                key, table.name
            ))
        })?;
        pairs.push((column, value));
    }
    pairs.sort_by(|a, b| a.0.name.cmp(&b.0.name));
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;
    use starmart_core::schema::SchemaRegistry;
    use std::sync::Arc;

    fn adapter() -> WarehouseAdapter {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/starmart_test")
            .expect("lazy pool");
        WarehouseAdapter::from_pool(pool, Arc::new(SchemaRegistry::star_schema()))
    }

    #[test]
    fn payload_with_unknown_column_is_rejected() {
        let registry = SchemaRegistry::star_schema();
        let table = registry.get_table("dim_customer").unwrap();
        let payload = json!({"customer_name": "Ada", "shoe_size": 38});
        let err =
            payload_pairs(table, payload.as_object().unwrap(), table.primary_key()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn payload_may_not_set_the_primary_key() {
        let registry = SchemaRegistry::star_schema();
        let table = registry.get_table("dim_product").unwrap();
        let payload = json!({"product_id": 7, "product_name": "Widget"});
        let err =
            payload_pairs(table, payload.as_object().unwrap(), table.primary_key()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn payload_pairs_are_sorted_by_column_name() {
        let registry = SchemaRegistry::star_schema();
        let table = registry.get_table("dim_customer").unwrap();
        let payload = json!({"email": "a@b.c", "city": "Lyon", "customer_name": "Ada"});
        let pairs =
            payload_pairs(table, payload.as_object().unwrap(), table.primary_key()).unwrap();
        let names: Vec<&str> = pairs.iter().map(|(c, _)| c.name.as_str()).collect();
        assert_eq!(names, vec!["city", "customer_name", "email"]);
    }

    #[tokio::test]
    async fn fetch_by_key_rejects_unknown_columns() {
        let adapter = adapter();
        let registry = SchemaRegistry::star_schema();
        let table = registry.get_table("fact_sales").unwrap();
        let err = adapter
            .fetch_by_key(table, "no_such_fk", 1, 0, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }
}
