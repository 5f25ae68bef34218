pub mod check;
pub mod mcp;
pub mod seed;
pub mod serve;

use anyhow::Context;
use starmart_adapter_pg::WarehouseAdapter;
use starmart_core::config::StarmartConfig;
use starmart_core::schema::SchemaRegistry;
use starmart_guard::QueryGuard;
use std::sync::Arc;

/// Connect the adapter and build a guard over the shared registry.
pub(crate) async fn connect(
    config: &StarmartConfig,
) -> anyhow::Result<(Arc<WarehouseAdapter>, Arc<QueryGuard>)> {
    let registry = Arc::new(SchemaRegistry::star_schema());
    let adapter = WarehouseAdapter::connect(&config.database, Arc::clone(&registry))
        .await
        .context("connecting to the warehouse database")?;
    let guard = QueryGuard::new(registry, config.guard.clone());
    Ok((Arc::new(adapter), Arc::new(guard)))
}
