//! Bridge MCP tools into the mcpmux tool system.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MuxError;
use crate::tools::{Tool, ToolArguments, ToolExecutionContext, ToolParameters};

use super::schema::MCPToolSchema;
use super::session::ToolSession;

/// A tool discovered on a remote server, invoked through its session.
pub struct MCPTool {
    session: Arc<dyn ToolSession>,
    name: String,
    description: String,
    parameters: ToolParameters,
}

impl MCPTool {
    pub fn new(session: Arc<dyn ToolSession>, schema: MCPToolSchema) -> Self {
        Self {
            session,
            name: schema.name,
            description: schema.description.unwrap_or_default(),
            parameters: if schema.input_schema.is_object() {
                ToolParameters::from_schema(schema.input_schema)
            } else {
                ToolParameters::empty()
            },
        }
    }

    /// Endpoint URL of the session backing this tool.
    pub fn endpoint(&self) -> &str {
        self.session.endpoint()
    }
}

#[async_trait]
impl Tool for MCPTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, MuxError> {
        let arguments = args.to_object()?;
        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                let message = format!("call to '{}' was cancelled", self.name);
                return Err(MuxError::Cancelled(message));
            }
            result = self.session.call_tool(&self.name, arguments) => result?,
        };
        Ok(result.into_value_or_text())
    }
}

impl std::fmt::Debug for MCPTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MCPTool")
            .field("name", &self.name)
            .field("endpoint", &self.session.endpoint())
            .finish()
    }
}
