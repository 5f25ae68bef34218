//! `starmart check` - validate a query offline and print the verdict.
//!
//! Needs no database: the guard is purely lexical.

use starmart_core::config::StarmartConfig;
use starmart_core::schema::SchemaRegistry;
use starmart_guard::QueryGuard;
use std::sync::Arc;

pub fn run(config: StarmartConfig, sql: &str, limit: Option<u64>) -> anyhow::Result<()> {
    let guard = QueryGuard::new(Arc::new(SchemaRegistry::star_schema()), config.guard.clone());
    let verdict = guard.validate(sql, limit);

    if verdict.accepted {
        println!("accepted (row limit {})", verdict.effective_row_limit);
        println!("{}", verdict.normalized_text);
    } else {
        let code = verdict.reason.map(|r| r.code()).unwrap_or("rejected");
        println!("rejected: {code}");
        if let Some(detail) = &verdict.detail {
            println!("  {detail}");
        }
        std::process::exit(1);
    }
    Ok(())
}
