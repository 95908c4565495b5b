//! MCP client session backed by an rmcp running service.

use std::sync::{Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, CallToolResult, Content, JsonObject, ResourceContents},
    service::{ClientInitializeError, Peer, RoleClient, ServiceError},
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::error::MuxError;

use super::schema::{MCPToolCallResult, MCPToolSchema};
use super::session::{SessionState, ToolSession};
use super::transport::{self, MCPRunningService};

/// Client for one Model Context Protocol server.
///
/// Calls go through a cloned [`Peer`], so any number of invocations may run
/// concurrently; the running service itself is only touched on disconnect.
pub struct MCPClient {
    endpoint: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<MCPRunningService>>,
    state: StdMutex<SessionState>,
}

impl MCPClient {
    /// Connect to `endpoint` and complete the initialize handshake.
    pub async fn connect(endpoint: &EndpointConfig) -> Result<Self, MuxError> {
        let service = transport::connect_endpoint(endpoint).await?;
        Ok(Self::from_running_service(endpoint.url.clone(), service))
    }

    /// Create a client from an already-running rmcp service.
    ///
    /// Initialization handshake is already handled by rmcp `serve(...)`.
    pub fn from_running_service(endpoint: impl Into<String>, service: MCPRunningService) -> Self {
        Self {
            endpoint: endpoint.into(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            state: StdMutex::new(SessionState::Live),
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn ensure_live(&self) -> Result<(), MuxError> {
        match self.state() {
            SessionState::Live => Ok(()),
            state => Err(MuxError::Stream(format!(
                "MCP session for {} is {state}",
                self.endpoint
            ))),
        }
    }

    async fn list_tools_from_peer(&self) -> Result<Vec<rmcp::model::Tool>, ServiceError> {
        match self.peer.list_all_tools().await {
            Ok(tools) => Ok(tools),
            Err(ServiceError::UnexpectedResponse) => {
                self.peer.list_tools(None).await.map(|page| page.tools)
            }
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl ToolSession for MCPClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn list_tools(&self) -> Result<Vec<MCPToolSchema>, MuxError> {
        self.ensure_live()?;
        let tools = self
            .list_tools_from_peer()
            .await
            .map_err(|e| map_service_error("list_tools", e))?;
        Ok(tools.into_iter().map(map_mcp_tool_schema).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<MCPToolCallResult, MuxError> {
        self.ensure_live()?;
        let result = self
            .peer
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        map_call_result(name, result)
    }

    async fn disconnect(&self) -> Result<(), MuxError> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        self.set_state(SessionState::Disconnecting);
        let result = service.cancel().await;
        self.set_state(SessionState::Closed);

        match result {
            Ok(reason) => {
                debug!(endpoint = %self.endpoint, ?reason, "MCP session closed");
                Ok(())
            }
            Err(error) => Err(MuxError::teardown(&self.endpoint, error)),
        }
    }
}

impl std::fmt::Debug for MCPClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MCPClient")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

fn map_mcp_tool_schema(tool: rmcp::model::Tool) -> MCPToolSchema {
    MCPToolSchema {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let mut lines = Vec::new();
    for item in content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
            continue;
        }
        if let Some(resource) = item.as_resource() {
            if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
                lines.push(text.clone());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<MCPToolCallResult, MuxError> {
    let text_content = extract_text_content(&result.content);
    let content = result
        .content
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect::<Vec<_>>();

    if result.is_error.unwrap_or(false) {
        let message = result
            .structured_content
            .as_ref()
            .map(|v| v.to_string())
            .or_else(|| text_content.clone())
            .unwrap_or_else(|| "MCP tool returned an error result".into());

        return Err(MuxError::ToolExecution {
            tool_name: name.to_string(),
            message,
        });
    }

    Ok(MCPToolCallResult {
        structured_content: result.structured_content,
        text_content,
        content,
    })
}

pub(crate) fn map_client_initialize_error(error: ClientInitializeError) -> MuxError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            MuxError::Stream(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => MuxError::Stream(format!(
            "MCP initialize transport error ({context}): {error}"
        )),
        ClientInitializeError::JsonRpcError(error) => MuxError::Provider {
            provider: "mcp".into(),
            message: format!(
                "MCP initialize JSON-RPC error {}: {}",
                error.code.0, error.message
            ),
        },
        ClientInitializeError::Cancelled => MuxError::Cancelled("MCP initialize cancelled".into()),
        other => MuxError::Provider {
            provider: "mcp".into(),
            message: format!("MCP initialize error: {other}"),
        },
    }
}

fn map_service_error(context: &str, error: ServiceError) -> MuxError {
    match error {
        ServiceError::McpError(error) => MuxError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP error {}: {}", error.code.0, error.message),
        },
        ServiceError::TransportSend(error) => {
            MuxError::Stream(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            MuxError::Stream(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => MuxError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: unexpected MCP response"),
        },
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            MuxError::Cancelled(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => MuxError::Timeout(timeout.as_millis() as u64),
        other => MuxError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP service error: {other}"),
        },
    }
}
