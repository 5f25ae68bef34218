//! Guarded ad-hoc SQL routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(run_sql))
        .route("/tables", get(list_tables))
        .route("/examples", get(examples))
}

#[derive(Debug, Deserialize)]
struct SqlParams {
    q: String,
    limit: Option<u64>,
}

async fn run_sql(
    State(state): State<AppState>,
    Query(params): Query<SqlParams>,
) -> Result<Json<Value>, ApiError> {
    let verdict = state.guard.validate(&params.q, params.limit);
    if !verdict.accepted {
        return Err(ApiError::rejected(&verdict));
    }

    let result = state.adapter.run_select(&verdict).await?;
    Ok(Json(json!({
        "query": verdict.normalized_text,
        "columns": result.columns,
        "data": result.rows,
        "row_count": result.row_count,
        "truncated": result.truncated,
        "status": "success",
    })))
}

async fn list_tables(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry();
    let mut schemas = serde_json::Map::new();
    for table in registry.list_tables() {
        let columns: Vec<Value> = table
            .columns
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "type": c.column_type.sql_type(),
                    "nullable": c.nullable,
                    "primary_key": c.primary_key,
                })
            })
            .collect();
        schemas.insert(
            table.name.clone(),
            json!({
                "columns": columns,
                "column_count": table.columns.len(),
            }),
        );
    }

    Json(json!({
        "available_tables": registry.table_names(),
        "table_schemas": schemas,
        "total_tables": registry.list_tables().len(),
    }))
}

async fn examples(State(state): State<AppState>) -> Json<Value> {
    let examples = example_queries();
    let limits = state.guard.limits();
    Json(json!({
        "examples": examples,
        "total_examples": examples.len(),
        "usage_tips": [
            "All queries must start with SELECT",
            format!("Maximum query length is {} characters", limits.max_query_len),
            format!("Maximum {} rows returned per query", limits.hard_row_cap),
            format!(
                "Only tables: {} are accessible",
                state.registry().table_names().join(", ")
            ),
            "Comments (-- or /* */) are not allowed",
            "Use LIMIT to control result size",
        ],
    }))
}

fn example_queries() -> Vec<Value> {
    vec![
        json!({
            "title": "Get all customers",
            "description": "Retrieve all customer records",
            "query": "SELECT * FROM dim_customer LIMIT 10",
        }),
        json!({
            "title": "Product categories",
            "description": "Count products by category",
            "query": "SELECT category, COUNT(*) AS product_count FROM dim_product \
                      GROUP BY category ORDER BY product_count DESC",
        }),
        json!({
            "title": "Top customers by sales",
            "description": "Find customers with highest total sales",
            "query": "SELECT c.customer_name, SUM(f.total_amount) AS total_sales \
                      FROM fact_sales f JOIN dim_customer c ON f.customer_id = c.customer_id \
                      GROUP BY c.customer_name ORDER BY total_sales DESC LIMIT 10",
        }),
        json!({
            "title": "Monthly sales summary",
            "description": "Sales summary by month",
            "query": "SELECT d.month_name, d.year, COUNT(*) AS order_count, \
                      SUM(f.total_amount) AS total_sales FROM fact_sales f \
                      JOIN dim_date d ON f.date_id = d.date_id \
                      GROUP BY d.year, d.month, d.month_name ORDER BY d.year, d.month",
        }),
        json!({
            "title": "Weekend vs weekday sales",
            "description": "Compare sales between weekends and weekdays",
            "query": "SELECT CASE WHEN d.is_weekend = 1 THEN 'Weekend' ELSE 'Weekday' END AS period, \
                      COUNT(*) AS order_count, AVG(f.total_amount) AS avg_order_value \
                      FROM fact_sales f JOIN dim_date d ON f.date_id = d.date_id \
                      GROUP BY d.is_weekend",
        }),
        json!({
            "title": "Product performance",
            "description": "Best selling products with details",
            "query": "SELECT p.product_name, p.category, p.brand, COUNT(*) AS times_sold, \
                      SUM(f.quantity) AS total_quantity, SUM(f.total_amount) AS total_revenue \
                      FROM fact_sales f JOIN dim_product p ON f.product_id = p.product_id \
                      GROUP BY p.product_name, p.category, p.brand \
                      ORDER BY total_revenue DESC LIMIT 15",
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use starmart_core::config::GuardConfig;
    use starmart_core::schema::SchemaRegistry;
    use starmart_guard::QueryGuard;
    use std::sync::Arc;

    #[test]
    fn every_example_query_passes_the_guard() {
        let guard = QueryGuard::new(
            Arc::new(SchemaRegistry::star_schema()),
            GuardConfig::default(),
        );
        for example in example_queries() {
            let query = example["query"].as_str().unwrap();
            let verdict = guard.validate(query, None);
            assert!(verdict.accepted, "rejected example: {query}");
        }
    }
}
