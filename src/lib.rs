//! mcpmux: multi-endpoint MCP tool aggregation
//!
//! Connects to many remote Model Context Protocol servers at once, merges the
//! tools they expose into one name-keyed set, optionally binds a caller
//! identity into designated tools, and releases every session exactly once.
//!
//! # Quick Start
//!
//! ```no_run
//! use mcpmux::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> mcpmux::error::Result<()> {
//! let endpoints = vec![
//!     EndpointConfig::new("https://tools.example.com/mcp", "http")
//!         .header("Authorization", "Bearer abc"),
//! ];
//!
//! let aggregated = MCPAggregator::new()
//!     .aggregate(&endpoints, Some("user-42"), CancellationToken::new())
//!     .await;
//!
//! for definition in aggregated.tools().definitions() {
//!     println!("{}: {}", definition.name, definition.description);
//! }
//!
//! aggregated.teardown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod tools;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
