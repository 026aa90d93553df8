/// MCP over HTTP
///
/// Routes:
/// - `GET  /mcp` server description
/// - `POST /mcp` JSON-RPC dispatch (`202 Accepted` for notifications)
/// - `GET  /mcp/tools` tool list (bearer auth required)
/// - `POST /mcp/tools/{toolName}` direct tool invocation (bearer auth required)
/// - `GET  /health` liveness plus the number of live paging cursors

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AuthContext, AuthError};
use crate::mcp::dispatcher::{DispatchError, Dispatcher};
use crate::mcp::protocol::{
    error_codes, JsonRpcRequest, JsonRpcResponse, McpServerInfo, ToolCallResult, ToolsListResult,
};
use crate::storage::PaginationStore;

/// Shared state of the HTTP handlers
#[derive(Debug, Clone)]
pub struct HttpState {
    pub dispatcher: Arc<Dispatcher>,
    pub pagination: Arc<PaginationStore>,
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub paging_entries: usize,
}

/// Build the HTTP router
///
/// An empty `allowed_origins` list allows any origin.
pub fn router(state: HttpState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/mcp", get(server_info).post(handle_rpc))
        .route("/mcp/tools", get(list_tools))
        .route("/mcp/tools/{tool_name}", post(invoke_tool))
        .route("/health", get(health))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::UnknownTool { .. } => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            DispatchError::Internal { .. } | DispatchError::Unauthenticated { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(self.into_rpc_response())).into_response()
            }
            DispatchError::MethodNotFound { .. } | DispatchError::InvalidParams { .. } => {
                (StatusCode::BAD_REQUEST, Json(self.into_rpc_response())).into_response()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": self.to_string()}))).into_response()
    }
}

fn auth_from_headers(headers: &HeaderMap) -> AuthContext {
    AuthContext::from_header(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
    )
}

fn rpc_error(status: StatusCode, id: Value, code: i32, message: String) -> Response {
    (status, Json(JsonRpcResponse::error(id, code, message, None))).into_response()
}

async fn server_info() -> Json<McpServerInfo> {
    Json(McpServerInfo::default())
}

async fn health(State(state): State<HttpState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        paging_entries: state.pagination.len(),
    })
}

async fn handle_rpc(State(state): State<HttpState>, headers: HeaderMap, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "invalid JSON-RPC body");
            return rpc_error(
                StatusCode::BAD_REQUEST,
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Invalid JSON: {}", e),
            );
        }
    };

    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                id,
                error_codes::INVALID_REQUEST,
                format!("Invalid request: {}", e),
            );
        }
    };

    let auth = auth_from_headers(&headers);
    let notification = request.is_notification();
    match state.dispatcher.dispatch(request, &auth).await {
        Ok(Some(response)) if !notification => Json(response).into_response(),
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(e) if notification => {
            debug!(error = %e, "dropping error for notification");
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn list_tools(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    if let Err(e) = auth_from_headers(&headers).api_key() {
        return e.into_response();
    }

    Json(ToolsListResult {
        tools: state.dispatcher.tools().definitions(),
    })
    .into_response()
}

async fn invoke_tool(
    State(state): State<HttpState>,
    Path(tool_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let auth = auth_from_headers(&headers);
    let api_key = match auth.api_key() {
        Ok(key) => key,
        Err(e) => return e.into_response(),
    };

    let request_id = Uuid::new_v4();
    info!(request_id = %request_id, tool = %tool_name, "tool invocation");

    let arguments = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(arguments) => arguments,
            Err(e) => return Json(ToolCallResult::error(format!("Invalid JSON body: {}", e))).into_response(),
        }
    };

    let result = match state.dispatcher.tools().execute(&tool_name, arguments, api_key).await {
        Ok(output) => ToolCallResult::from_output(&output).unwrap_or_else(ToolCallResult::error),
        Err(e) => {
            warn!(request_id = %request_id, tool = %tool_name, error = %e, "tool invocation failed");
            ToolCallResult::error(e)
        }
    };

    Json(result).into_response()
}
