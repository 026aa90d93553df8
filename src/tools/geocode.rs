/// Tool for address to coordinate lookup
///
/// This module implements the `geocode` MCP tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::GeocodeParams;
use crate::mcp::ToolDefinition;
use crate::tools::{build_geocode_query, input_schema, parse_arguments, Tool, ToolError};
use crate::upstream::MapRepository;

pub const GEOCODE_TOOL: &str = "geocode";

pub struct GeocodeTool {
    repository: Arc<dyn MapRepository>,
}

impl GeocodeTool {
    pub fn new(repository: Arc<dyn MapRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Tool for GeocodeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: GEOCODE_TOOL.to_string(),
            description: "Convert an address into latitude and longitude with the Yahoo! Geocoder API."
                .to_string(),
            input_schema: input_schema::<GeocodeParams>(),
        }
    }

    async fn execute(&self, arguments: Value, api_key: &str) -> Result<Value, ToolError> {
        let params: GeocodeParams = parse_arguments(arguments)?;
        let query = build_geocode_query(&params, api_key)?;
        let result = self.repository.geocode(&query).await?;
        Ok(serde_json::to_value(result)?)
    }
}
