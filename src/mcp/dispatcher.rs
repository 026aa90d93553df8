/// JSON-RPC method routing
///
/// Methods are resolved by exact name through a fixed table built at startup.
/// The dispatcher holds no per-client state, so methods may arrive in any
/// order (`tools/call` before `initialize` is fine).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AuthContext, AuthError};
use crate::mcp::protocol::{
    error_codes, InitializeResult, JsonRpcRequest, JsonRpcResponse, SetLevelParams, ToolCallParams,
    ToolCallResult, ToolsListResult,
};
use crate::tools::{ToolError, ToolRegistry};

/// The MCP methods this server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodHandler {
    Initialize,
    Initialized,
    SetLogLevel,
    ListTools,
    CallTool,
}

impl MethodHandler {
    pub const ALL: [MethodHandler; 5] = [
        MethodHandler::Initialize,
        MethodHandler::Initialized,
        MethodHandler::SetLogLevel,
        MethodHandler::ListTools,
        MethodHandler::CallTool,
    ];

    /// Wire name of the method
    pub fn method(self) -> &'static str {
        match self {
            MethodHandler::Initialize => "initialize",
            MethodHandler::Initialized => "notifications/initialized",
            MethodHandler::SetLogLevel => "logging/setLevel",
            MethodHandler::ListTools => "tools/list",
            MethodHandler::CallTool => "tools/call",
        }
    }
}

/// Errors raised while building the dispatch table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Method '{0}' is registered more than once")]
    DuplicateMethod(&'static str),
}

/// Failures that cannot be expressed as a tool result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Method not found: {method}")]
    MethodNotFound { id: Option<Value>, method: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { id: Option<Value>, name: String },

    #[error("Invalid params: {message}")]
    InvalidParams { id: Option<Value>, message: String },

    #[error("Internal error: {message}")]
    Internal { id: Option<Value>, message: String },

    /// `tools/call` without usable credentials; reported as an internal error
    #[error("{reason}")]
    Unauthenticated { id: Option<Value>, reason: AuthError },
}

impl DispatchError {
    pub fn id(&self) -> Option<&Value> {
        match self {
            DispatchError::MethodNotFound { id, .. }
            | DispatchError::UnknownTool { id, .. }
            | DispatchError::InvalidParams { id, .. }
            | DispatchError::Internal { id, .. }
            | DispatchError::Unauthenticated { id, .. } => id.as_ref(),
        }
    }

    /// JSON-RPC error code
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            DispatchError::UnknownTool { .. } | DispatchError::InvalidParams { .. } => {
                error_codes::INVALID_PARAMS
            }
            DispatchError::Internal { .. } | DispatchError::Unauthenticated { .. } => {
                error_codes::INTERNAL_ERROR
            }
        }
    }

    /// JSON-RPC error envelope echoing the request id
    pub fn into_rpc_response(self) -> JsonRpcResponse {
        let id = self.id().cloned().unwrap_or(Value::Null);
        let code = self.code();
        let data = match &self {
            DispatchError::Internal { message, .. } => Some(Value::String(message.clone())),
            DispatchError::Unauthenticated { reason, .. } => Some(Value::String(reason.to_string())),
            _ => None,
        };
        let message = match &self {
            DispatchError::Internal { .. } | DispatchError::Unauthenticated { .. } => "Internal error".to_string(),
            other => other.to_string(),
        };
        JsonRpcResponse::error(id, code, message, data)
    }
}

/// Routes JSON-RPC requests to the method handlers
#[derive(Debug)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, MethodHandler>,
    tools: Arc<ToolRegistry>,
}

impl Dispatcher {
    /// Dispatcher answering every MCP method this server supports
    pub fn new(tools: Arc<ToolRegistry>) -> Result<Self, RegistrationError> {
        Self::with_handlers(tools, &MethodHandler::ALL)
    }

    /// Dispatcher answering only `handlers`, rejecting duplicates
    pub fn with_handlers(
        tools: Arc<ToolRegistry>,
        handlers: &[MethodHandler],
    ) -> Result<Self, RegistrationError> {
        let mut table = HashMap::with_capacity(handlers.len());
        for handler in handlers {
            if table.insert(handler.method(), *handler).is_some() {
                return Err(RegistrationError::DuplicateMethod(handler.method()));
            }
        }
        Ok(Self {
            handlers: table,
            tools,
        })
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one request
    ///
    /// Returns `Ok(None)` when the method produces no response. Tool failures
    /// come back as `isError` results, not as errors. Missing credentials on
    /// `tools/call` fail before any tool is looked up.
    pub async fn dispatch(
        &self,
        request: JsonRpcRequest,
        auth: &AuthContext,
    ) -> Result<Option<JsonRpcResponse>, DispatchError> {
        let Some(handler) = self.handlers.get(request.method.as_str()).copied() else {
            warn!(method = %request.method, "method not found");
            return Err(DispatchError::MethodNotFound {
                id: request.id,
                method: request.method,
            });
        };
        debug!(method = handler.method(), "dispatching");

        let id = request.response_id();
        let result = match handler {
            MethodHandler::Initialize => to_result(&request, InitializeResult::default())?,
            MethodHandler::Initialized => return Ok(None),
            MethodHandler::SetLogLevel => {
                let params: SetLevelParams = parse_params(&request)?;
                info!(level = %params.level, "client requested log level");
                json!({})
            }
            MethodHandler::ListTools => to_result(
                &request,
                ToolsListResult {
                    tools: self.tools.definitions(),
                },
            )?,
            MethodHandler::CallTool => {
                let api_key = auth.api_key().map_err(|reason| {
                    warn!(error = %reason, "tool call without credentials");
                    DispatchError::Unauthenticated {
                        id: request.id.clone(),
                        reason,
                    }
                })?;
                let params: ToolCallParams = parse_params(&request)?;
                let result = self.call_tool(&request, params, api_key).await?;
                to_result(&request, result)?
            }
        };

        Ok(Some(JsonRpcResponse::success(id, result)))
    }

    async fn call_tool(
        &self,
        request: &JsonRpcRequest,
        params: ToolCallParams,
        api_key: &str,
    ) -> Result<ToolCallResult, DispatchError> {
        if !self.tools.contains(&params.name) {
            return Err(DispatchError::UnknownTool {
                id: request.id.clone(),
                name: params.name,
            });
        }

        match self.tools.execute(&params.name, params.arguments, api_key).await {
            Ok(output) => ToolCallResult::from_output(&output).map_err(|e| DispatchError::Internal {
                id: request.id.clone(),
                message: e.to_string(),
            }),
            Err(ToolError::UnknownTool(name)) => Err(DispatchError::UnknownTool {
                id: request.id.clone(),
                name,
            }),
            Err(e) => {
                warn!(tool = %params.name, error = %e, "tool call failed");
                Ok(ToolCallResult::error(e))
            }
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, DispatchError> {
    let params = request.params.clone().unwrap_or_else(|| json!({}));
    serde_json::from_value(params).map_err(|e| DispatchError::InvalidParams {
        id: request.id.clone(),
        message: e.to_string(),
    })
}

fn to_result<T: Serialize>(request: &JsonRpcRequest, value: T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal {
        id: request.id.clone(),
        message: e.to_string(),
    })
}
