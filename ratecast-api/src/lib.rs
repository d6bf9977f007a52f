//! # Ratecast API Server
//!
//! HTTP front end for the rate quote, subscriptions, and rate broadcast.
//!
//! ## Endpoints
//!
//! - `GET /rate` - Current BTC/USD rate as a JSON number
//! - `POST /subscribe` - Subscribe the form field `email`
//! - `POST /sendEmails` - Mail the current rate to every subscriber
//! - `GET /health` - Liveness and subscriber count
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratecast_api::{ApiServer, AppState};
//!
//! let state = AppState::new(registry, rates, mailer);
//! let server = ApiServer::new(state);
//! server.run("127.0.0.1:8080".parse()?).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod routes;
mod handlers;
mod state;
mod dto;
mod error;
pub mod config;

pub use routes::create_router;
pub use state::AppState;
pub use config::AppConfig;
pub use dto::HealthResponse;
pub use error::ApiError;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server for Ratecast.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server around the given collaborators.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes and request logging configured.
    pub fn router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until the process is killed.
    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, std::future::pending()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight requests are allowed to finish before this returns.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Ratecast API server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
