/// Domain module containing the tool inputs and results
///
/// This module defines what MCP clients send to the map tools, the upstream
/// query parameters those inputs are turned into, and the flattened results
/// handed back to clients.

pub mod query;
pub mod place;

// Re-export public types for easy access
pub use query::*;
pub use place::*;

use thiserror::Error;

/// Errors raised while validating tool input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl DomainError {
    /// Shorthand for a validation failure with the given message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }
}
