//! Session seam between the aggregator and concrete MCP connections.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use strum::Display;

use crate::config::EndpointConfig;
use crate::error::MuxError;

use super::schema::{MCPToolCallResult, MCPToolSchema};

/// Lifecycle of a created session.
///
/// A connect attempt that fails never yields a session, so there is no
/// failed state here; `Live -> Disconnecting -> Closed` is entered at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Live,
    Disconnecting,
    Closed,
}

/// One live connection to a remote tool-providing endpoint.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// URL this session was opened against.
    fn endpoint(&self) -> &str;

    fn state(&self) -> SessionState;

    /// List every tool the server exposes.
    async fn list_tools(&self) -> Result<Vec<MCPToolSchema>, MuxError>;

    /// Invoke a tool by its upstream name. Safe to call concurrently.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<MCPToolCallResult, MuxError>;

    /// Release the connection. Calls after the first are no-ops.
    async fn disconnect(&self) -> Result<(), MuxError>;
}

/// Opens sessions for endpoint configurations.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn ToolSession>, MuxError>;
}
