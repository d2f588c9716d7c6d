//! HTTP API over the Satchel session registry.
//!
//! This crate is the HTTP layer the registry is designed to sit behind:
//! it resolves identifiers from cookies or headers, mints new identifiers,
//! emits `Set-Cookie` headers with the configured attributes, and exposes
//! the session bag as JSON.
//!
//! # Example
//!
//! ```ignore
//! use satchel_server::{Server, ServerConfig};
//! use satchel_session::{SessionConfig, SessionRegistry};
//!
//! let registry = SessionRegistry::new(SessionConfig::default());
//! let server = Server::new(registry, ServerConfig::new());
//! server.run(shutdown_token).await?;
//! ```

pub mod config;
pub mod cookie;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;

use axum::Router;
use satchel_session::SessionRegistry;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Satchel HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server around a registry.
    pub fn new(registry: SessionRegistry, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(registry, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(routes::health_routes())
            .nest("/api/v1", self.api_routes());

        let router = if self.state.config().request_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        };

        router.with_state(self.state.clone())
    }

    /// API routes (v1).
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route(
                "/session",
                post(routes::create_session_handler)
                    .get(routes::get_session_handler)
                    .delete(routes::delete_session_handler),
            )
            .route("/session/refresh", post(routes::refresh_session_handler))
            .route(
                "/session/values/{key}",
                get(routes::get_value_handler)
                    .put(routes::put_value_handler)
                    .delete(routes::delete_value_handler),
            )
            .route("/sessions/count", get(routes::count_handler))
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.state.config().bind_address;
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Satchel server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Satchel server stopped");
        Ok(())
    }
}
