/// Tool for coordinate to address lookup
///
/// This module implements the `reverseGeocode` MCP tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ReverseGeocodeParams;
use crate::mcp::ToolDefinition;
use crate::tools::{build_reverse_geocode_query, input_schema, parse_arguments, Tool, ToolError};
use crate::upstream::MapRepository;

pub const REVERSE_GEOCODE_TOOL: &str = "reverseGeocode";

pub struct ReverseGeocodeTool {
    repository: Arc<dyn MapRepository>,
}

impl ReverseGeocodeTool {
    pub fn new(repository: Arc<dyn MapRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Tool for ReverseGeocodeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: REVERSE_GEOCODE_TOOL.to_string(),
            description: "Convert latitude and longitude into an address with the Yahoo! Reverse Geocoder API."
                .to_string(),
            input_schema: input_schema::<ReverseGeocodeParams>(),
        }
    }

    async fn execute(&self, arguments: Value, api_key: &str) -> Result<Value, ToolError> {
        let params: ReverseGeocodeParams = parse_arguments(arguments)?;
        let query = build_reverse_geocode_query(&params, api_key);
        let result = self.repository.reverse_geocode(&query).await?;
        Ok(serde_json::to_value(result)?)
    }
}
