//! MCP server: JSON-RPC 2.0 over stdio.
//!
//! One request per line in, one response per line out. A failed tool
//! call produces an error tool result or a JSON-RPC error response; it
//! never takes the transport loop down.

use crate::error::McpError;
use crate::executor::ToolExecutor;
use crate::protocol::{
    CallToolParams, JsonRpcRequest, JsonRpcResponse, ListToolsResponse, error_codes,
};
use serde_json::{Value, json};
use starmart_core::config::McpConfig;
use std::io::{BufRead, Write};

pub struct McpServer {
    config: McpConfig,
    executor: ToolExecutor,
}

impl McpServer {
    pub fn new(config: McpConfig, executor: ToolExecutor) -> Self {
        Self { config, executor }
    }

    /// Serve requests from stdin until it closes.
    pub async fn run(&self) -> Result<(), McpError> {
        tracing::info!(name = %self.config.name, "starting MCP server on stdio");

        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let mut stdout_lock = stdout.lock();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(err) => JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("invalid request: {err}"),
                ),
            };

            writeln!(stdout_lock, "{}", serde_json::to_string(&response)?)?;
            stdout_lock.flush()?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "shutdown" => JsonRpcResponse::success(id, json!({})),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": {
                "name": self.config.name,
                "version": self.config.version,
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let response = ListToolsResponse {
            tools: self.executor.tools(),
        };
        match serde_json::to_value(response) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, err.to_string())
            }
        }
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(err)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("invalid params: {err}"),
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "missing params".to_string(),
                );
            }
        };

        match self.executor.call(&params.name, params.arguments).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(err) => {
                    JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, err.to_string())
                }
            },
            Err(McpError::ToolNotFound { name }) => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("tool not found: {name}"),
            ),
            Err(McpError::InvalidArguments { tool, reason }) => JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("invalid arguments for {tool}: {reason}"),
            ),
            Err(err) => {
                JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use starmart_adapter_pg::WarehouseAdapter;
    use starmart_core::config::GuardConfig;
    use starmart_core::schema::SchemaRegistry;
    use starmart_guard::QueryGuard;
    use std::sync::Arc;

    fn server() -> McpServer {
        let registry = Arc::new(SchemaRegistry::star_schema());
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/starmart_test")
            .unwrap();
        let adapter = Arc::new(WarehouseAdapter::from_pool(pool, Arc::clone(&registry)));
        let guard = Arc::new(QueryGuard::new(registry, GuardConfig::default()));
        McpServer::new(McpConfig::default(), ToolExecutor::new(adapter, guard))
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let response = server().handle_request(request("initialize", None)).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "starmart");
    }

    #[tokio::test]
    async fn tools_list_includes_query_tool() {
        let response = server().handle_request(request("tools/list", None)).await;
        let result = response.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert!(tools.iter().any(|t| t["name"] == "query_warehouse"));
        assert!(tools.iter().all(|t| t["name"] != "seed_sample_data"));
    }

    #[tokio::test]
    async fn unknown_method_is_a_protocol_error() {
        let response = server().handle_request(request("nonsense", None)).await;
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_call_requires_params() {
        let response = server().handle_request(request("tools/call", None)).await;
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn rejected_sql_is_a_tool_error_not_a_protocol_error() {
        let params = json!({
            "name": "query_warehouse",
            "arguments": {"sql": "DELETE FROM fact_sales"},
        });
        let response = server()
            .handle_request(request("tools/call", Some(params)))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
    }
}
