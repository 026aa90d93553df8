/// MCP tools for the Yahoo! map API
///
/// This module contains the tools that MCP clients can call, the registry
/// that looks them up by name, and the query builders that turn tool
/// arguments into map API requests.

pub mod builder;
pub mod geocode;
pub mod local_search;
pub mod reverse_geocode;

// Re-export tool types for easy access
pub use builder::*;
pub use geocode::GeocodeTool;
pub use local_search::LocalSearchTool;
pub use reverse_geocode::ReverseGeocodeTool;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::DomainError;
use crate::mcp::ToolDefinition;
use crate::storage::PaginationStore;
use crate::upstream::{MapRepository, UpstreamError};

/// Errors a tool call can end in
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while assembling a tool registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool '{0}' is registered more than once")]
    DuplicateTool(String),
}

/// A named operation exposed to MCP clients
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and input schema advertised by `tools/list`
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with raw JSON arguments and the caller's API key
    async fn execute(&self, arguments: Value, api_key: &str) -> Result<Value, ToolError>;
}

/// Deserialize tool arguments, treating `null` as an empty object
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, DomainError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| DomainError::InvalidArguments(e.to_string()))
}

/// JSON schema of a tool's argument type
pub fn input_schema<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    value
}

/// Tools available to a server, keyed by name
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate names
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut map = HashMap::with_capacity(tools.len());
        let mut order = Vec::with_capacity(tools.len());

        for tool in tools {
            let name = tool.definition().name;
            if map.contains_key(&name) {
                return Err(RegistryError::DuplicateTool(name));
            }
            order.push(name.clone());
            map.insert(name, tool);
        }

        Ok(Self { tools: map, order })
    }

    /// The three map tools sharing one repository and one pagination store
    pub fn standard(
        repository: Arc<dyn MapRepository>,
        pagination: Arc<PaginationStore>,
    ) -> Result<Self, RegistryError> {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(LocalSearchTool::new(repository.clone(), pagination)),
            Arc::new(GeocodeTool::new(repository.clone())),
            Arc::new(ReverseGeocodeTool::new(repository)),
        ];
        Self::new(tools)
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up `name` and run it
    pub async fn execute(&self, name: &str, arguments: Value, api_key: &str) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(arguments, api_key).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.order).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRepository;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::standard(
            Arc::new(FakeRepository::default()),
            Arc::new(PaginationStore::with_system_clock()),
        )
        .unwrap()
    }

    #[test]
    fn test_standard_registry_lists_three_tools() {
        let names: Vec<String> = registry().definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["localSearch", "geocode", "reverseGeocode"]);
    }

    #[test]
    fn test_duplicate_tool_is_rejected() {
        let repo: Arc<dyn MapRepository> = Arc::new(FakeRepository::default());
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(GeocodeTool::new(repo.clone())),
            Arc::new(GeocodeTool::new(repo)),
        ];
        let result = ToolRegistry::new(tools);

        assert_eq!(result.unwrap_err(), RegistryError::DuplicateTool("geocode".to_string()));
    }

    #[test]
    fn test_unknown_tool() {
        let err = tokio_test::block_on(registry().execute("nope", json!({}), "key")).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nope"));
    }

    #[test]
    fn test_input_schema_is_an_object_schema() {
        let schema = input_schema::<crate::domain::GeocodeParams>();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["query"].is_object());
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn test_parse_arguments_null_is_empty_object() {
        let params: crate::domain::LocalSearchParams = parse_arguments(Value::Null).unwrap();
        assert_eq!(params, crate::domain::LocalSearchParams::default());

        let err = parse_arguments::<crate::domain::GeocodeParams>(json!({"query": 3})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArguments(_)));
    }
}
