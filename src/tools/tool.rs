//! The tool trait every aggregated capability implements.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::types::{ToolDefinition, ToolParameters};
use crate::error::MuxError;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Fires when the caller abandons the call; remote tools stop waiting.
    pub cancel: CancellationToken,
}

impl ToolExecutionContext {
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

/// A named, invocable capability.
///
/// Every tool in a [`ToolSet`](super::ToolSet) implements this, whether it is
/// backed by a remote MCP session or wraps another tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Execute the tool with parsed arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, MuxError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters().schema.clone(),
        }
    }
}
