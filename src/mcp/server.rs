/// MCP server over stdin/stdout
///
/// This module implements the stdio transport that:
/// 1. Reads newline-delimited JSON-RPC requests from stdin
/// 2. Hands each one to the [`Dispatcher`]
/// 3. Writes JSON-RPC responses to stdout, one per line
///
/// Logs go to stderr so they never interleave with protocol messages.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::config::AuthContext;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::*;
use crate::ServerError;

/// Stdio transport driving a shared dispatcher
pub struct StdioServer {
    dispatcher: Arc<Dispatcher>,
    /// Credentials used for every request on this connection
    auth: AuthContext,
}

impl StdioServer {
    pub fn new(dispatcher: Arc<Dispatcher>, auth: AuthContext) -> Self {
        Self { dispatcher, auth }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&self) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `reader` until it is exhausted
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server, waiting for JSON-RPC requests...");
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        writer.write_all(response_str.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    async fn process_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        let notification = request.is_notification();
        match self.dispatcher.dispatch(request, &self.auth).await {
            Ok(response) => response.filter(|_| !notification),
            Err(e) if notification => {
                debug!(error = %e, "dropping error for notification");
                None
            }
            Err(e) => Some(e.into_rpc_response()),
        }
    }
}
