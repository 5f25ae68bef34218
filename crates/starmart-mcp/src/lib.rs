//! MCP bridge for the starmart warehouse.
//!
//! Exposes the analytics surface (entity reads and writes, the fixed
//! aggregations, registry introspection, and the guarded ad-hoc SQL
//! path) as callable tools for a natural-language agent, speaking MCP
//! JSON-RPC over stdio. Operations tagged administrative (sample-data
//! seeding) are never exposed as tools.
//!
//! The language-model orchestration itself is the connecting client's
//! concern; this crate only serves tool discovery and execution.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod server;
pub mod stats;

pub use catalog::ToolCatalog;
pub use error::McpError;
pub use executor::ToolExecutor;
pub use server::McpServer;
