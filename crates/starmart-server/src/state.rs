//! Shared request state.

use starmart_adapter_pg::WarehouseAdapter;
use starmart_core::config::SeedConfig;
use starmart_core::schema::SchemaRegistry;
use starmart_guard::QueryGuard;
use std::sync::Arc;

/// Everything a handler needs. Cheap to clone; all members are shared.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<WarehouseAdapter>,
    pub guard: Arc<QueryGuard>,
    pub seed: SeedConfig,
}

impl AppState {
    pub fn new(adapter: Arc<WarehouseAdapter>, guard: Arc<QueryGuard>, seed: SeedConfig) -> Self {
        Self {
            adapter,
            guard,
            seed,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.adapter.registry()
    }
}
