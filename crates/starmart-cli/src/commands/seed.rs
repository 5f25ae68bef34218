//! `starmart seed` - create the tables and load sample data.

use crate::commands::connect;
use starmart_core::config::StarmartConfig;

pub async fn run(config: StarmartConfig) -> anyhow::Result<()> {
    let (adapter, _guard) = connect(&config).await?;

    adapter.ensure_schema().await?;
    let report = adapter.seed(&config.seed).await?;

    println!(
        "seeded {} customers, {} products, {} dates, {} sales",
        report.customers, report.products, report.dates, report.sales
    );
    Ok(())
}
