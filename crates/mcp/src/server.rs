//! MCP server implementation exposing the hybrid search pipeline as a
//! single `search` tool.

use std::sync::Arc;

use hybridsearch_orchestrator::{Orchestrator, SearchRequest};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, ErrorCode, ErrorData, Implementation, ProtocolVersion,
    ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ServerHandler, ServiceExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::McpToolError;
use crate::tool::SearchToolInput;

/// MCP server exposing the hybrid search pipeline as a single agent tool.
#[derive(Clone)]
pub struct HybridSearchMcpServer {
    tool_router: ToolRouter<Self>,
    orchestrator: Arc<Orchestrator>,
    default_store: String,
}

impl std::fmt::Debug for HybridSearchMcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridSearchMcpServer")
            .field("default_store", &self.default_store)
            .finish()
    }
}

impl HybridSearchMcpServer {
    pub fn new(orchestrator: Arc<Orchestrator>, default_store: impl Into<String>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            orchestrator,
            default_store: default_store.into(),
        }
    }
}

#[tool_router]
impl HybridSearchMcpServer {
    /// Search indexed source code using hybrid sparse/dense retrieval,
    /// fusion, and reranking.
    #[tool(
        name = "search",
        description = "Search indexed source code using hybrid keyword and semantic retrieval. Returns ranked code chunks with file paths, line ranges, and relevance scores."
    )]
    async fn search(
        &self,
        Parameters(input): Parameters<SearchToolInput>,
    ) -> Result<CallToolResult, ErrorData> {
        info!("executing search tool: query={}", input.query);

        let store = input.store.unwrap_or_else(|| self.default_store.clone());
        let mut request = SearchRequest::new(store, input.query);
        request.top_k = input.top_k;

        let response = self
            .orchestrator
            .search(request, CancellationToken::new())
            .await
            .map_err(|e| to_error_data(&McpToolError::Search(e.to_string())))?;

        let json_output = serde_json::to_string_pretty(&response_to_json(&response))
            .map_err(|e| to_error_data(&McpToolError::Serialization(e)))?;

        info!("search tool completed: {} results", response.results.len());

        Ok(CallToolResult::success(vec![Content::text(json_output)]))
    }
}

fn response_to_json(response: &hybridsearch_orchestrator::SearchResponse) -> serde_json::Value {
    serde_json::json!({
        "request_id": response.request_id.to_string(),
        "query": response.query,
        "store": response.store,
        "total": response.results.len(),
        "results": response.results,
        "intelligence": {
            "intent": response.intent,
            "difficulty": response.difficulty,
            "strategy": response.strategy,
            "confidence": response.confidence,
        },
    })
}

#[tool_handler]
impl ServerHandler for HybridSearchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "hybridsearch-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Hybrid code search over indexed repositories. Use the search tool with a \
                natural-language or code-shaped query to find relevant functions and files."
                    .to_string(),
            ),
        }
    }
}

fn to_error_data(err: &McpToolError) -> ErrorData {
    ErrorData {
        code: ErrorCode::INTERNAL_ERROR,
        message: err.to_tool_error_message().into(),
        data: None,
    }
}

/// Runs the MCP server over stdio until the client disconnects.
pub async fn run_mcp_server(orchestrator: Arc<Orchestrator>, default_store: String) -> anyhow::Result<()> {
    info!("starting MCP server, default store = {default_store}");

    let server = HybridSearchMcpServer::new(orchestrator, default_store);

    let service = server.serve(rmcp::transport::stdio()).await?;

    info!("MCP server started, waiting for client requests");

    service.waiting().await?;

    info!("MCP server shutting down");
    Ok(())
}
