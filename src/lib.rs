/// Public library interface for the Yahoo! map MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub mod config;
pub mod domain;
pub mod mcp;
pub mod storage;
pub mod tools;
pub mod upstream;

#[cfg(test)]
mod testing;

// Re-export public modules and types
pub use config::{AppConfig, AuthContext, AuthError, Transport};
pub use domain::*;
pub use mcp::{Dispatcher, HttpState, StdioServer};
pub use storage::{Clock, ManualClock, PaginationStore, PagingKey, SystemClock};
pub use tools::{Tool, ToolError, ToolRegistry};
pub use upstream::{MapRepository, UpstreamEndpoints, UpstreamError, YahooMapRepository};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Method registration error: {0}")]
    Registration(#[from] mcp::RegistrationError),

    #[error("Tool registration error: {0}")]
    Tools(#[from] tools::RegistryError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main map server that implements the MCP protocol
///
/// Owns the pagination store and the dispatcher; both transports share them.
pub struct YahooMapServer {
    config: AppConfig,
    pagination: Arc<PaginationStore>,
    dispatcher: Arc<Dispatcher>,
}

impl YahooMapServer {
    /// Create a server talking to the real map API
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let repository = YahooMapRepository::new(config.endpoints.clone(), config.upstream_timeout)?;
        Self::with_repository(config, Arc::new(repository), Arc::new(SystemClock))
    }

    /// Create a server on top of any repository and clock
    pub fn with_repository(
        config: AppConfig,
        repository: Arc<dyn MapRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServerError> {
        let pagination = Arc::new(PaginationStore::new(clock, config.paging_ttl));
        let tools = ToolRegistry::standard(repository, pagination.clone())?;
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(tools))?);

        info!(tools = dispatcher.tools().len(), "map server initialized");
        Ok(Self {
            config,
            pagination,
            dispatcher,
        })
    }

    /// Run the configured transport until shutdown
    pub async fn run(self) -> Result<(), ServerError> {
        match self.config.transport {
            Transport::Http => self.run_http().await,
            Transport::Stdio => self.run_stdio().await,
        }
    }

    /// HTTP router serving the MCP endpoints
    pub fn router(&self) -> Router {
        let state = HttpState {
            dispatcher: self.dispatcher.clone(),
            pagination: self.pagination.clone(),
        };
        mcp::router(state, &self.config.allowed_origins)
    }

    /// Serve HTTP until Ctrl-C, sweeping expired cursors in the background
    pub async fn run_http(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr()?;
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %addr, "listening on");

        let sweeper = tokio::spawn(sweep_expired(self.pagination.clone(), self.config.sweep_interval));
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();

        result?;
        info!("HTTP server shutdown complete");
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout
    pub async fn run_stdio(self) -> Result<(), ServerError> {
        let auth = match self.config.api_key.as_deref() {
            Some(key) => AuthContext::bearer(key),
            None => {
                tracing::warn!("no API key configured; tool calls will fail");
                AuthContext::anonymous()
            }
        };
        StdioServer::new(self.dispatcher.clone(), auth).run().await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the pagination store (useful for testing)
    pub fn pagination(&self) -> &Arc<PaginationStore> {
        &self.pagination
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

async fn sweep_expired(pagination: Arc<PaginationStore>, every: Duration) {
    let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
    loop {
        interval.tick().await;
        let purged = pagination.purge_expired();
        if purged > 0 {
            debug!(purged, remaining = pagination.len(), "purged expired paging cursors");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
