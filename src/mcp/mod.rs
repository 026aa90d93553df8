/// MCP protocol implementation
///
/// This module handles the Model Context Protocol communication: JSON-RPC
/// message types, method dispatch, and the stdio and HTTP transports.

pub mod dispatcher;
pub mod http;
pub mod protocol;
pub mod server;

// Re-export main types
pub use dispatcher::{DispatchError, Dispatcher, MethodHandler, RegistrationError};
pub use http::{router, HttpState};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, ToolCallResult, ToolDefinition};
pub use server::StdioServer;
