//! Model Context Protocol (MCP) sessions, discovery and multi-endpoint aggregation.

pub mod aggregate;
pub mod bridge;
pub mod client;
pub mod discovery;
pub mod injection;
pub mod schema;
pub mod session;
pub mod teardown;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use aggregate::{AggregatedTools, MCPAggregator};
pub use bridge::MCPTool;
pub use client::MCPClient;
pub use discovery::discover_tools;
pub use injection::{InjectedTool, InjectionPolicy, InjectionRule};
pub use schema::{MCPToolCallResult, MCPToolSchema};
pub use session::{SessionConnector, SessionState, ToolSession};
pub use teardown::{TeardownHandle, TeardownSummary};
pub use transport::{connect_endpoint, TransportConnector};
