//! Unified error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Endpoint unreachable or handshake rejected.
    Connection,
    /// Session is live but tool listing failed.
    Discovery,
    /// Releasing a session failed.
    Teardown,
    Network,
    Timeout,
    Protocol,
    Configuration,
    Serialization,
    ToolExecution,
    Cancelled,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckEndpoint,
    CheckConfiguration,
    IncreaseTimeout,
    CheckToolImplementation,
    Ignore,
    ContactSupport,
}
