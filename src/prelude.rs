//! Convenience re-exports for common use.

pub use crate::config::{AggregatorConfig, EndpointConfig, EndpointsFile, TransportKind};
pub use crate::error::{MuxError, Result};
pub use crate::mcp::{
    AggregatedTools, InjectionPolicy, InjectionRule, MCPAggregator, TeardownHandle,
    TeardownSummary,
};
pub use crate::tools::{Tool, ToolArguments, ToolDefinition, ToolExecutionContext, ToolSet};
