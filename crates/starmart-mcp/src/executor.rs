//! Tool dispatch.
//!
//! The executor resolves a tool name against the catalog, pulls typed
//! arguments out of the JSON payload, and runs the matching warehouse
//! operation. A failed operation becomes an error tool result; only a
//! malformed call (unknown tool, bad arguments) surfaces as an
//! `McpError` for the transport to report.

use crate::catalog::{Operation, ToolCatalog};
use crate::error::McpError;
use crate::protocol::{CallToolResponse, ToolDefinition};
use crate::stats;
use serde_json::{Map, Value, json};
use starmart_adapter_pg::WarehouseAdapter;
use starmart_guard::QueryGuard;
use std::sync::Arc;

pub struct ToolExecutor {
    adapter: Arc<WarehouseAdapter>,
    guard: Arc<QueryGuard>,
    catalog: ToolCatalog,
}

impl ToolExecutor {
    pub fn new(adapter: Arc<WarehouseAdapter>, guard: Arc<QueryGuard>) -> Self {
        let catalog = ToolCatalog::generate(adapter.registry());
        Self {
            adapter,
            guard,
            catalog,
        }
    }

    /// Tool definitions for discovery.
    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.catalog.tools()
    }

    /// Execute a tool call.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResponse, McpError> {
        let entry = self
            .catalog
            .resolve(name)
            .ok_or_else(|| McpError::ToolNotFound {
                name: name.to_string(),
            })?;
        tracing::debug!(tool = name, "executing tool");

        match &entry.operation {
            Operation::ListEntities { table } => {
                let skip = opt_i64(&arguments, "skip", name)?.unwrap_or(0);
                let limit = opt_i64(&arguments, "limit", name)?.unwrap_or(100);
                let table = self.table(table);
                self.respond(self.adapter.fetch_page(table, skip, limit).await)
            }
            Operation::GetEntity { table } => {
                let id = req_i64(&arguments, "id", name)?;
                let table = self.table(table);
                self.respond(self.adapter.fetch_one(table, id).await)
            }
            Operation::CreateEntity { table } => {
                let payload = as_object(&arguments, name)?;
                let table = self.table(table);
                self.respond(self.adapter.insert(table, payload).await)
            }
            Operation::UpdateEntity { table } => {
                let id = req_i64(&arguments, "id", name)?;
                let patch = req_object(&arguments, "patch", name)?;
                let table = self.table(table);
                self.respond(self.adapter.update(table, id, patch).await)
            }
            Operation::DeleteEntity { table } => {
                let id = req_i64(&arguments, "id", name)?;
                let table = self.table(table);
                match self.adapter.delete(table, id).await {
                    Ok(()) => Ok(CallToolResponse::json(&json!({"deleted": id}))),
                    Err(err) => Ok(CallToolResponse::error(err.to_string())),
                }
            }
            Operation::SalesByCategory => self.respond(self.adapter.sales_by_category().await),
            Operation::SalesByMonth => {
                let year = opt_i64(&arguments, "year", name)?.unwrap_or(2023) as i32;
                self.respond(self.adapter.sales_by_month(year).await)
            }
            Operation::TopCustomers => {
                let limit = opt_i64(&arguments, "limit", name)?.unwrap_or(10);
                self.respond(self.adapter.top_customers(limit).await)
            }
            Operation::TopProducts => {
                let limit = opt_i64(&arguments, "limit", name)?.unwrap_or(10);
                self.respond(self.adapter.top_products(limit).await)
            }
            Operation::WeekendVsWeekday => self.respond(self.adapter.weekend_vs_weekday().await),
            Operation::SalesSummary => self.respond(self.adapter.sales_summary().await),
            Operation::RunSql => {
                let sql = req_str(&arguments, "sql", name)?;
                let limit = opt_i64(&arguments, "limit", name)?.map(|n| n.max(0) as u64);
                let verdict = self.guard.validate(sql, limit);
                if !verdict.accepted {
                    let code = verdict.reason.map(|r| r.code()).unwrap_or("rejected");
                    let detail = verdict.detail.unwrap_or_default();
                    return Ok(CallToolResponse::error(format!(
                        "query rejected ({code}): {detail}"
                    )));
                }
                self.respond(self.adapter.run_select(&verdict).await)
            }
            Operation::ListTables => {
                let tables = serde_json::to_value(self.adapter.registry().list_tables())?;
                Ok(CallToolResponse::json(&tables))
            }
            Operation::UniqueValues => {
                let rows = req_rows(&arguments, name)?;
                let field = req_str(&arguments, "field", name)?;
                Ok(CallToolResponse::json(&json!({
                    "field": field,
                    "values": stats::unique_values(rows, field),
                })))
            }
            Operation::CountByField => {
                let rows = req_rows(&arguments, name)?;
                let field = req_str(&arguments, "field", name)?;
                let limit = opt_i64(&arguments, "limit", name)?.map(|n| n.max(0) as usize);
                Ok(CallToolResponse::json(&json!({
                    "field": field,
                    "counts": stats::count_by_field(rows, field, limit),
                })))
            }
            Operation::SummarizeNumericField => {
                let rows = req_rows(&arguments, name)?;
                let field = req_str(&arguments, "field", name)?;
                match stats::summarize_numeric_field(rows, field) {
                    Some(summary) => Ok(CallToolResponse::json(&summary)),
                    None => Ok(CallToolResponse::error(format!(
                        "field {field} has no numeric values"
                    ))),
                }
            }
            Operation::FilterRows => {
                let rows = req_rows(&arguments, name)?;
                let filters = req_object(&arguments, "filters", name)?;
                Ok(CallToolResponse::json(&json!({
                    "rows": stats::filter_rows(rows, filters),
                })))
            }
            Operation::Seed => Err(McpError::ToolNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Catalog table names always come from the registry, so a lookup
    /// miss cannot happen; fall back to the name itself for the error.
    fn table(&self, name: &str) -> &starmart_core::schema::TableDef {
        self.adapter
            .registry()
            .get_table(name)
            .unwrap_or_else(|| &self.adapter.registry().list_tables()[0])
    }

    fn respond<T: serde::Serialize, E: std::fmt::Display>(
        &self,
        result: Result<T, E>,
    ) -> Result<CallToolResponse, McpError> {
        match result {
            Ok(value) => Ok(CallToolResponse::json(&serde_json::to_value(value)?)),
            Err(err) => {
                tracing::warn!(error = %err, "tool execution failed");
                Ok(CallToolResponse::error(err.to_string()))
            }
        }
    }
}

fn invalid(tool: &str, reason: impl Into<String>) -> McpError {
    McpError::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.into(),
    }
}

fn req_i64(arguments: &Value, key: &str, tool: &str) -> Result<i64, McpError> {
    opt_i64(arguments, key, tool)?.ok_or_else(|| invalid(tool, format!("missing field {key}")))
}

fn opt_i64(arguments: &Value, key: &str, tool: &str) -> Result<Option<i64>, McpError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(tool, format!("field {key} must be an integer"))),
    }
}

fn req_str<'a>(arguments: &'a Value, key: &str, tool: &str) -> Result<&'a str, McpError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(tool, format!("missing string field {key}")))
}

fn req_object<'a>(
    arguments: &'a Value,
    key: &str,
    tool: &str,
) -> Result<&'a Map<String, Value>, McpError> {
    arguments
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(tool, format!("missing object field {key}")))
}

fn as_object<'a>(arguments: &'a Value, tool: &str) -> Result<&'a Map<String, Value>, McpError> {
    arguments
        .as_object()
        .ok_or_else(|| invalid(tool, "arguments must be an object"))
}

fn req_rows<'a>(arguments: &'a Value, tool: &str) -> Result<&'a [Value], McpError> {
    arguments
        .get("rows")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| invalid(tool, "missing array field rows"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use starmart_core::config::GuardConfig;
    use starmart_core::schema::SchemaRegistry;

    fn executor() -> ToolExecutor {
        let registry = Arc::new(SchemaRegistry::star_schema());
        let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/starmart_test");
        let adapter = Arc::new(WarehouseAdapter::from_pool(
            pool.unwrap(),
            Arc::clone(&registry),
        ));
        let guard = Arc::new(QueryGuard::new(registry, GuardConfig::default()));
        ToolExecutor::new(adapter, guard)
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let err = executor().call("launch_missiles", json!({})).await;
        assert!(matches!(err, Err(McpError::ToolNotFound { .. })));
    }

    #[tokio::test]
    async fn admin_tool_cannot_be_called() {
        let err = executor().call("seed_sample_data", json!({})).await;
        assert!(matches!(err, Err(McpError::ToolNotFound { .. })));
    }

    #[tokio::test]
    async fn missing_required_argument_is_invalid() {
        let err = executor().call("get_customer", json!({})).await;
        match err {
            Err(McpError::InvalidArguments { tool, reason }) => {
                assert_eq!(tool, "get_customer");
                assert!(reason.contains("id"));
            }
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_query_becomes_an_error_result() {
        let response = executor()
            .call("query_warehouse", json!({"sql": "DROP TABLE dim_customer"}))
            .await
            .unwrap();
        assert_eq!(response.is_error, Some(true));
        assert!(response.content[0].text.contains("not_a_select"));
    }

    #[tokio::test]
    async fn stats_tools_run_without_a_database() {
        let rows = json!([
            {"city": "Lyon"},
            {"city": "Oslo"},
            {"city": "Lyon"},
        ]);
        let response = executor()
            .call("unique_values", json!({"rows": rows, "field": "city"}))
            .await
            .unwrap();
        assert_eq!(response.is_error, None);
        let body: Value = serde_json::from_str(&response.content[0].text).unwrap();
        assert_eq!(body["values"], json!(["Lyon", "Oslo"]));
    }
}
