//! Configuration (layered: code > env > defaults).

pub mod endpoint;

pub use endpoint::{EndpointConfig, EndpointsFile, HeaderPair, SupportedTransport, TransportKind};

use std::time::Duration;

use bon::Builder;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_CONCURRENT_CONNECTIONS: usize = 8;

/// Timeouts and limits for one aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct AggregatorConfig {
    /// Upper bound on connecting plus the initialize handshake.
    #[builder(default = DEFAULT_CONNECT_TIMEOUT)]
    pub connect_timeout: Duration,
    /// Upper bound on listing tools from one live session.
    #[builder(default = DEFAULT_DISCOVERY_TIMEOUT)]
    pub discovery_timeout: Duration,
    /// Upper bound on each individual disconnect during teardown.
    #[builder(default = DEFAULT_TEARDOWN_TIMEOUT)]
    pub teardown_timeout: Duration,
    #[builder(default = DEFAULT_MAX_CONCURRENT_CONNECTIONS)]
    pub max_concurrent_connections: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AggregatorConfig {
    /// Load overrides from environment variables (`MCPMUX_*`), reading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let mut config = Self::default();
        if let Some(timeout) = millis("MCPMUX_CONNECT_TIMEOUT_MS") {
            config.connect_timeout = timeout;
        }
        if let Some(timeout) = millis("MCPMUX_DISCOVERY_TIMEOUT_MS") {
            config.discovery_timeout = timeout;
        }
        if let Some(timeout) = millis("MCPMUX_TEARDOWN_TIMEOUT_MS") {
            config.teardown_timeout = timeout;
        }
        if let Some(limit) = lookup("MCPMUX_MAX_CONCURRENCY")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|limit| *limit > 0)
        {
            config.max_concurrent_connections = limit;
        }
        config
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_connections(mut self, limit: usize) -> Self {
        self.max_concurrent_connections = limit.max(1);
        self
    }
}
