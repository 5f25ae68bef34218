//! `starmart mcp` - run the MCP tool server on stdio.

use crate::commands::connect;
use starmart_core::config::StarmartConfig;
use starmart_mcp::{McpServer, ToolExecutor};

pub async fn run(config: StarmartConfig) -> anyhow::Result<()> {
    let (adapter, guard) = connect(&config).await?;
    let executor = ToolExecutor::new(adapter, guard);
    let server = McpServer::new(config.mcp.clone(), executor);
    server.run().await?;
    Ok(())
}
