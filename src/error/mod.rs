//! Error types for mcpmux.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Boxed underlying cause carried by connection failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Primary error type for all mcpmux operations.
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Tool discovery on {url} failed: {message}")]
    Discovery { url: String, message: String },

    #[error("Disconnect from {url} failed: {message}")]
    Teardown { url: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Provider error: {provider} — {message}")]
    Provider { provider: String, message: String },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl MuxError {
    /// Wrap any error as a connection failure for `url`.
    pub fn connection(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Create a discovery failure for `url`.
    pub fn discovery(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Discovery {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a teardown failure for `url`.
    pub fn teardown(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Teardown {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Endpoint URL this error is scoped to, if any.
    pub fn endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Connection { url, .. }
            | Self::Discovery { url, .. }
            | Self::Teardown { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Discovery { .. } => ErrorCategory::Discovery,
            Self::Teardown { .. } => ErrorCategory::Teardown,
            Self::Network(_) | Self::Stream(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Provider { .. } => ErrorCategory::Protocol,
            Self::Configuration(_) | Self::Toml(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::ToolExecution { .. } | Self::InvalidArgument(_) => ErrorCategory::ToolExecution,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Connection
                | ErrorCategory::Discovery
                | ErrorCategory::Network
                | ErrorCategory::Timeout
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Connection => RecoverySuggestion::CheckEndpoint,
            ErrorCategory::Discovery | ErrorCategory::Network => {
                RecoverySuggestion::RetryWithBackoff
            }
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
            ErrorCategory::Teardown | ErrorCategory::Cancelled => RecoverySuggestion::Ignore,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MuxError>;
