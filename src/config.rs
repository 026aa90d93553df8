/// Runtime configuration and caller credentials

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::upstream::UpstreamEndpoints;

/// How the server talks to MCP clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// JSON-RPC and REST over HTTP
    Http,
    /// Newline-delimited JSON-RPC over stdin/stdout
    Stdio,
}

/// Resolved server settings
#[derive(Clone)]
pub struct AppConfig {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    pub allowed_origins: Vec<String>,
    pub upstream_timeout: Duration,
    pub endpoints: UpstreamEndpoints,
    pub paging_ttl: chrono::Duration,
    pub sweep_interval: Duration,
    /// Key used by the stdio transport, which has no Authorization header
    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Http,
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
            upstream_timeout: Duration::from_secs(10),
            endpoints: UpstreamEndpoints::default(),
            paging_ttl: crate::storage::default_paging_ttl(),
            sweep_interval: Duration::from_secs(60),
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Address the HTTP transport binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("transport", &self.transport)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("endpoints", &self.endpoints)
            .field("paging_ttl", &self.paging_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reasons a caller could not be authenticated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header (expected 'Bearer <appid>')")]
    MissingBearer,

    #[error("Empty bearer token")]
    EmptyToken,
}

/// Pull the API key out of an `Authorization: Bearer <key>` header value
pub fn extract_api_key(header: Option<&str>) -> Result<String, AuthError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingBearer)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token.to_string())
}

/// Credentials attached to one request
///
/// The key is forwarded upstream as `appid` and is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    api_key: Result<String, AuthError>,
}

impl AuthContext {
    /// Context from a raw `Authorization` header value
    pub fn from_header(header: Option<&str>) -> Self {
        Self {
            api_key: extract_api_key(header),
        }
    }

    /// Context holding an already known key
    pub fn bearer(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Self::anonymous();
        }
        Self { api_key: Ok(api_key) }
    }

    /// Context of a caller that sent no credentials
    pub fn anonymous() -> Self {
        Self {
            api_key: Err(AuthError::MissingBearer),
        }
    }

    pub fn api_key(&self) -> Result<&str, AuthError> {
        self.api_key.as_deref().map_err(Clone::clone)
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_ok()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.api_key {
            Ok(_) => "<redacted>".to_string(),
            Err(e) => e.to_string(),
        };
        f.debug_struct("AuthContext").field("api_key", &state).finish()
    }
}
