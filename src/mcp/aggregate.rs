//! Multi-endpoint MCP aggregation with ordered merge and scoped teardown.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{AggregatorConfig, EndpointConfig};
use crate::error::MuxError;
use crate::tools::{Tool, ToolSet};
use crate::util::timeout::with_timeout;

use super::discovery::discover_tools;
use super::injection::InjectionPolicy;
use super::session::{SessionConnector, ToolSession};
use super::teardown::{TeardownHandle, TeardownSummary};
use super::transport::TransportConnector;

/// What one endpoint contributed.
enum EndpointOutcome {
    Ready {
        session: Arc<dyn ToolSession>,
        tools: Vec<Arc<dyn Tool>>,
    },
    /// Connected, but contributes no tools. Still owned for teardown.
    Unusable { session: Arc<dyn ToolSession> },
    /// Connected while cancellation fired. Owned for teardown, not a failure.
    Interrupted { session: Arc<dyn ToolSession> },
    Failed,
    Skipped,
}

/// Result of one aggregation: the merged tools plus the handle that
/// releases their sessions.
///
/// Dropping every clone of the teardown handle (including the one held here)
/// releases the sessions, after which the tools report closed sessions.
#[derive(Debug, Clone)]
pub struct AggregatedTools {
    tools: ToolSet,
    teardown: TeardownHandle,
}

impl AggregatedTools {
    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn teardown_handle(&self) -> &TeardownHandle {
        &self.teardown
    }

    /// Release every session. Idempotent.
    pub async fn teardown(&self) -> TeardownSummary {
        self.teardown.teardown().await
    }

    /// Sessions owned by this aggregation, including ones whose discovery failed.
    pub fn session_count(&self) -> usize {
        self.teardown.session_count()
    }

    pub fn into_parts(self) -> (ToolSet, TeardownHandle) {
        (self.tools, self.teardown)
    }
}

/// Connects to many endpoints at once and hands back one tool set.
pub struct MCPAggregator {
    connector: Arc<dyn SessionConnector>,
    policy: InjectionPolicy,
    config: AggregatorConfig,
}

impl Default for MCPAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MCPAggregator {
    /// Aggregator using the network transports and the built-in injection table.
    pub fn new() -> Self {
        Self {
            connector: Arc::new(TransportConnector),
            policy: InjectionPolicy::builtin(),
            config: AggregatorConfig::default(),
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn SessionConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_injection_policy(mut self, policy: InjectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn injection_policy(&self) -> &InjectionPolicy {
        &self.policy
    }

    /// Connect to every endpoint, discover their tools and merge them.
    ///
    /// Endpoint failures are logged and skipped; this never fails as a whole.
    /// Later endpoints win name collisions. A non-empty `identity` is bound
    /// into the tools named by the injection policy. If `cancel` fires while
    /// aggregating, every created session is released and the set is empty;
    /// if it fires later, the sessions are released automatically.
    pub async fn aggregate(
        &self,
        endpoints: &[EndpointConfig],
        identity: Option<&str>,
        cancel: CancellationToken,
    ) -> AggregatedTools {
        let span = info_span!(
            "mcp_aggregate",
            aggregation_id = %Uuid::new_v4(),
            endpoints = endpoints.len()
        );
        self.aggregate_inner(endpoints, identity, cancel)
            .instrument(span)
            .await
    }

    async fn aggregate_inner(
        &self,
        endpoints: &[EndpointConfig],
        identity: Option<&str>,
        cancel: CancellationToken,
    ) -> AggregatedTools {
        let limit = self.config.max_concurrent_connections.max(1);
        let outcomes: Vec<EndpointOutcome> = stream::iter(
            endpoints
                .iter()
                .map(|endpoint| self.process_endpoint(endpoint, &cancel)),
        )
        .buffered(limit)
        .collect()
        .await;

        let mut sessions = Vec::new();
        let mut merged = ToolSet::new();
        let mut failed = 0usize;
        let mut interrupted = 0usize;
        for outcome in outcomes {
            match outcome {
                EndpointOutcome::Ready { session, tools } => {
                    for tool in tools {
                        if let Some(displaced) = merged.insert(tool) {
                            debug!(
                                tool = displaced.name(),
                                endpoint = session.endpoint(),
                                "tool overridden by later endpoint"
                            );
                        }
                    }
                    sessions.push(session);
                }
                EndpointOutcome::Unusable { session } => {
                    failed += 1;
                    sessions.push(session);
                }
                EndpointOutcome::Interrupted { session } => {
                    interrupted += 1;
                    sessions.push(session);
                }
                EndpointOutcome::Failed => failed += 1,
                EndpointOutcome::Skipped => {}
            }
        }

        let teardown =
            TeardownHandle::spawn(sessions, self.config.teardown_timeout, cancel.clone());

        if cancel.is_cancelled() {
            let summary = teardown.teardown().await;
            info!(
                interrupted,
                closed = summary.closed,
                failed = summary.failed,
                "aggregation cancelled; sessions released"
            );
            return AggregatedTools {
                tools: ToolSet::new(),
                teardown,
            };
        }

        let tools = match identity.filter(|identity| !identity.is_empty()) {
            Some(identity) => self.policy.apply(&merged, identity),
            None => merged,
        };

        info!(
            tools = tools.len(),
            sessions = teardown.session_count(),
            failed,
            "MCP tools aggregated"
        );

        AggregatedTools { tools, teardown }
    }

    async fn process_endpoint(
        &self,
        endpoint: &EndpointConfig,
        cancel: &CancellationToken,
    ) -> EndpointOutcome {
        if cancel.is_cancelled() {
            return EndpointOutcome::Skipped;
        }

        let connect = self.connector.connect(endpoint);
        let session = match with_timeout(self.config.connect_timeout, connect).await {
            Ok(session) => session,
            Err(error) => {
                let error = match error {
                    error @ MuxError::Connection { .. } => error,
                    other => MuxError::connection(&endpoint.url, other),
                };
                warn!(url = %endpoint.url, %error, "MCP endpoint unavailable; skipping");
                return EndpointOutcome::Failed;
            }
        };

        if cancel.is_cancelled() {
            debug!(url = %endpoint.url, "aggregation cancelled while connecting");
            return EndpointOutcome::Interrupted { session };
        }

        match discover_tools(&session, self.config.discovery_timeout).await {
            Ok(tools) => EndpointOutcome::Ready { session, tools },
            Err(error) => {
                warn!(url = %endpoint.url, %error, "MCP tool discovery failed; skipping");
                EndpointOutcome::Unusable { session }
            }
        }
    }
}
