//! Tool abstractions handed to the downstream consumer.

pub mod arguments;
pub mod set;
pub mod tool;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use arguments::ToolArguments;
pub use set::ToolSet;
pub use tool::{Tool, ToolExecutionContext};
pub use types::{ToolDefinition, ToolParameters};
