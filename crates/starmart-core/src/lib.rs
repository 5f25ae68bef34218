//! Shared types for the starmart analytics warehouse.
//!
//! This crate holds the two pieces every other starmart crate depends on:
//! the YAML-backed [`StarmartConfig`] and the immutable [`SchemaRegistry`]
//! describing which star-schema tables are reachable at all.

pub mod config;
pub mod schema;

pub use config::{
    ConfigError, DatabaseConfig, GuardConfig, McpConfig, SeedConfig, ServerConfig, StarmartConfig,
};
pub use schema::{ColumnDef, ColumnType, SchemaRegistry, TableDef};
