//! Tool discovery on a live session.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::MuxError;
use crate::tools::Tool;
use crate::util::timeout::with_timeout;

use super::bridge::MCPTool;
use super::session::ToolSession;

/// List the session's tools and wrap each one as an invocable [`Tool`].
///
/// Any failure, including hitting `timeout`, is reported as a discovery error
/// naming the session's endpoint.
pub async fn discover_tools(
    session: &Arc<dyn ToolSession>,
    timeout: Duration,
) -> Result<Vec<Arc<dyn Tool>>, MuxError> {
    let endpoint = session.endpoint().to_owned();
    let schemas = with_timeout(timeout, session.list_tools())
        .await
        .map_err(|e| MuxError::discovery(&endpoint, e))?;

    debug!(
        endpoint = %endpoint,
        tools = ?schemas.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "discovered MCP tools"
    );

    Ok(schemas
        .into_iter()
        .map(|schema| Arc::new(MCPTool::new(Arc::clone(session), schema)) as Arc<dyn Tool>)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::{tests::scripted_running_service, MCPClient};

    #[tokio::test]
    async fn discovered_tools_keep_server_order_and_schema() {
        let session: Arc<dyn ToolSession> = Arc::new(MCPClient::from_running_service(
            "http://alpha.test/mcp",
            scripted_running_service(&["search", "info"]),
        ));

        let tools = discover_tools(&session, Duration::from_secs(5))
            .await
            .expect("discovery should succeed");

        let names: Vec<_> = tools.iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec!["search", "info"]);
        assert_eq!(tools[0].description(), "search tool");
        assert_eq!(tools[0].parameters().schema["type"], "object");
    }

    #[tokio::test]
    async fn closed_session_reports_discovery_error() {
        let client = MCPClient::from_running_service(
            "http://alpha.test/mcp",
            scripted_running_service(&["search"]),
        );
        client.disconnect().await.unwrap();
        let session: Arc<dyn ToolSession> = Arc::new(client);

        let err = discover_tools(&session, Duration::from_secs(5))
            .await
            .err()
            .expect("closed session cannot be listed");

        assert!(matches!(
            err,
            MuxError::Discovery { url, .. } if url == "http://alpha.test/mcp"
        ));
    }
}
