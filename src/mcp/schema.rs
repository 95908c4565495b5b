//! MCP schema types.

use serde::{Deserialize, Serialize};

/// Schema for a tool exposed by an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// Result of one `tools/call` exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct MCPToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
    pub content: Vec<serde_json::Value>,
}

impl MCPToolCallResult {
    /// Prefer structured content, then joined text, then the raw content array.
    pub fn into_value_or_text(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        if let Some(text) = self.text_content {
            return serde_json::Value::String(text);
        }
        serde_json::Value::Array(self.content)
    }
}
