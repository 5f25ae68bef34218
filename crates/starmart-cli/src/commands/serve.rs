//! `starmart serve` - start the HTTP API server.

use crate::commands::connect;
use starmart_core::config::StarmartConfig;
use starmart_server::{ApiServer, AppState};

pub async fn run(config: StarmartConfig) -> anyhow::Result<()> {
    let (adapter, guard) = connect(&config).await?;
    let state = AppState::new(adapter, guard, config.seed.clone());
    let server = ApiServer::new(config.server.clone(), state);
    server.run().await?;
    Ok(())
}
