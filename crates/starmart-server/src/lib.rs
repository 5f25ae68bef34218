//! HTTP API server for the starmart warehouse.
//!
//! Serves the CRUD surface over the dimensions and the fact table, the
//! fixed aggregation endpoints, the guarded ad-hoc SQL endpoint, and
//! the administrative seeding endpoint.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use starmart_core::config::ServerConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// The HTTP API server.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(&self) -> Result<(), std::io::Error> {
        let addr = self.config.bind_addr();
        tracing::info!(address = %addr, "starting API server");

        let app = routes::create_router(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await
    }
}
