/// Tool for keyword and coordinate place search
///
/// This module implements the `localSearch` MCP tool. When the caller passes a
/// `sessionId`, repeated calls for the same search walk through the result
/// pages without the caller tracking offsets.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::LocalSearchParams;
use crate::mcp::ToolDefinition;
use crate::storage::PaginationStore;
use crate::tools::{build_local_search_query, input_schema, parse_arguments, Tool, ToolError};
use crate::upstream::MapRepository;

pub const LOCAL_SEARCH_TOOL: &str = "localSearch";

pub struct LocalSearchTool {
    repository: Arc<dyn MapRepository>,
    pagination: Arc<PaginationStore>,
}

impl LocalSearchTool {
    pub fn new(repository: Arc<dyn MapRepository>, pagination: Arc<PaginationStore>) -> Self {
        Self {
            repository,
            pagination,
        }
    }
}

#[async_trait]
impl Tool for LocalSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: LOCAL_SEARCH_TOOL.to_string(),
            description: "Search places by keyword or coordinates with Yahoo! Local Search. \
                Pass sessionId to page through results across calls."
                .to_string(),
            input_schema: input_schema::<LocalSearchParams>(),
        }
    }

    async fn execute(&self, arguments: Value, api_key: &str) -> Result<Value, ToolError> {
        let params: LocalSearchParams = parse_arguments(arguments)?;
        let built = build_local_search_query(&params, api_key, &self.pagination)?;
        debug!(
            session_id = ?params.session_id(),
            offset = built.offset,
            results = built.query.results,
            "local search page"
        );

        let mut result = self.repository.local_search(&built.query).await?;
        if !result.items.is_empty() {
            result.next_offset = built.next_offset;
        }

        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRepository;
    use serde_json::json;

    fn tool(repository: Arc<FakeRepository>) -> LocalSearchTool {
        LocalSearchTool::new(repository, Arc::new(PaginationStore::with_system_clock()))
    }

    #[test]
    fn test_without_session_always_starts_at_zero() {
        let repository = Arc::new(FakeRepository::default());
        let tool = tool(repository.clone());

        for _ in 0..2 {
            let result = tokio_test::block_on(tool.execute(json!({"query": "ramen"}), "key")).unwrap();
            assert!(result.get("nextOffset").is_none());
        }
        assert_eq!(repository.starts(), vec![1, 1]);
    }

    #[test]
    fn test_session_pages_forward() {
        let repository = Arc::new(FakeRepository::default());
        let tool = tool(repository.clone());
        let args = json!({"query": "ramen", "sessionId": "s1"});

        let first = tokio_test::block_on(tool.execute(args.clone(), "key")).unwrap();
        let second = tokio_test::block_on(tool.execute(args.clone(), "key")).unwrap();
        let reset_args = json!({"query": "ramen", "sessionId": "s1", "reset": true});
        let reset = tokio_test::block_on(tool.execute(reset_args, "key")).unwrap();

        assert_eq!(first["nextOffset"], 10);
        assert_eq!(second["nextOffset"], 20);
        assert_eq!(reset["nextOffset"], 10);
        assert_eq!(repository.starts(), vec![1, 11, 1]);
    }

    #[test]
    fn test_empty_page_has_no_next_offset() {
        let tool = tool(Arc::new(FakeRepository::empty()));
        let result = tokio_test::block_on(tool.execute(json!({"query": "x", "sessionId": "s1"}), "key")).unwrap();

        assert_eq!(result["items"], json!([]));
        assert!(result.get("nextOffset").is_none());
    }

    #[test]
    fn test_validation_error_skips_upstream() {
        let repository = Arc::new(FakeRepository::default());
        let tool = tool(repository.clone());

        let err = tokio_test::block_on(tool.execute(json!({"lat": 35.0}), "key")).unwrap_err();
        assert!(matches!(err, ToolError::Domain(_)));
        assert!(repository.starts().is_empty());
    }

    #[test]
    fn test_failed_upstream_call_still_consumes_page() {
        let repository = Arc::new(FakeRepository::failing());
        let pagination = Arc::new(PaginationStore::with_system_clock());
        let tool = LocalSearchTool::new(repository.clone(), pagination.clone());
        let args = json!({"query": "ramen", "sessionId": "s1"});

        assert!(tokio_test::block_on(tool.execute(args.clone(), "key")).is_err());
        assert!(tokio_test::block_on(tool.execute(args, "key")).is_err());
        assert_eq!(repository.starts(), vec![1, 11]);
    }

    #[test]
    fn test_definition_schema() {
        let definition = tool(Arc::new(FakeRepository::default())).definition();
        assert_eq!(definition.name, "localSearch");

        let properties = &definition.input_schema["properties"];
        for field in ["query", "lat", "lng", "sessionId", "offset", "reset", "results"] {
            assert!(properties.get(field).is_some(), "missing {field}");
        }
    }
}
