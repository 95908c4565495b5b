//! MCP transport layer.
//!
//! Each endpoint is reached through one of the supported wire transports and
//! then wrapped in an rmcp running service after the initialize handshake.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{ClientInfo, ProtocolVersion};
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService};
use tracing::debug;

use crate::config::{EndpointConfig, SupportedTransport, TransportKind};
use crate::error::MuxError;

use super::client::{map_client_initialize_error, MCPClient};
use super::session::{SessionConnector, ToolSession};

mod sse;
mod streamable_http;

pub use sse::SseClientTransport;
pub use streamable_http::StreamableHttpHandshake;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Something that can open a fresh wire connection and run the MCP
/// initialize handshake over it.
#[async_trait]
pub trait MCPHandshake: Send {
    /// Create and initialize a new rmcp running service.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError>;
}

/// Handshake for the legacy SSE transport (`GET` event stream + `POST` channel).
pub struct SseHandshake {
    url: reqwest::Url,
    headers: reqwest::header::HeaderMap,
}

impl SseHandshake {
    pub fn new(url: reqwest::Url, headers: reqwest::header::HeaderMap) -> Self {
        Self { url, headers }
    }
}

#[async_trait]
impl MCPHandshake for SseHandshake {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        use rmcp::service::ServiceExt;

        let transport = SseClientTransport::open(self.url.clone(), self.headers.clone())
            .await
            .map_err(|error| {
                ClientInitializeError::transport::<SseClientTransport>(error, "open sse stream")
            })?;

        client_info.into_dyn().serve(transport).await
    }
}

/// Build the handshake for an endpoint's declared transport.
pub fn handshake_for(endpoint: &EndpointConfig) -> Result<Box<dyn MCPHandshake>, MuxError> {
    let url = endpoint.parsed_url()?;
    let headers = endpoint.header_map()?;

    match &endpoint.transport {
        TransportKind::Supported(SupportedTransport::Stream) => {
            Ok(Box::new(SseHandshake::new(url, headers)))
        }
        TransportKind::Supported(SupportedTransport::Http) => {
            Ok(Box::new(StreamableHttpHandshake::new(url, headers)))
        }
        TransportKind::Unrecognized(kind) => Err(MuxError::Configuration(format!(
            "Unsupported transport type '{kind}'"
        ))),
    }
}

/// Open the endpoint and complete the initialize handshake.
///
/// Every failure is reported as a connection error naming the endpoint URL.
pub async fn connect_endpoint(endpoint: &EndpointConfig) -> Result<MCPRunningService, MuxError> {
    let mut handshake =
        handshake_for(endpoint).map_err(|e| MuxError::connection(&endpoint.url, e))?;
    debug!(url = %endpoint.url, transport = %endpoint.transport, "connecting MCP endpoint");

    connect_with_protocol_fallback(handshake.as_mut())
        .await
        .map_err(|e| MuxError::connection(&endpoint.url, e))
}

/// Try the latest protocol first, then retry once with 2024-11-05 if the
/// server rejects the version.
pub(crate) async fn connect_with_protocol_fallback(
    handshake: &mut dyn MCPHandshake,
) -> Result<MCPRunningService, MuxError> {
    let latest_client_info = ClientInfo {
        protocol_version: ProtocolVersion::LATEST,
        ..Default::default()
    };

    match handshake.connect(latest_client_info).await {
        Ok(session) => return Ok(session),
        Err(error) if should_retry_protocol_fallback(&error) => {
            debug!(%error, "retrying MCP initialize with legacy protocol version");
        }
        Err(error) => return Err(map_client_initialize_error(error)),
    }

    let fallback_client_info = ClientInfo {
        protocol_version: ProtocolVersion::V_2024_11_05,
        ..Default::default()
    };
    handshake
        .connect(fallback_client_info)
        .await
        .map_err(map_client_initialize_error)
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

/// Connector that opens real network sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportConnector;

#[async_trait]
impl SessionConnector for TransportConnector {
    async fn connect(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn ToolSession>, MuxError> {
        let client = MCPClient::connect(endpoint).await?;
        Ok(Arc::new(client))
    }
}
