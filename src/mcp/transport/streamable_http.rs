use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, ServiceExt};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;

use super::{MCPHandshake, MCPRunningService};

/// Handshake for the MCP streamable HTTP transport.
///
/// Endpoint headers are handed to the transport as custom headers, which it
/// attaches to every JSON-RPC POST.
pub struct StreamableHttpHandshake {
    url: reqwest::Url,
    headers: HashMap<HeaderName, HeaderValue>,
}

impl StreamableHttpHandshake {
    pub fn new(url: reqwest::Url, headers: HeaderMap) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { url, headers }
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    fn transport_config(&self) -> StreamableHttpClientTransportConfig {
        StreamableHttpClientTransportConfig::with_uri(self.url.as_str())
            .custom_headers(self.headers.clone())
    }
}

#[async_trait]
impl MCPHandshake for StreamableHttpHandshake {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        let transport = StreamableHttpClientTransport::from_config(self.transport_config());

        client_info.into_dyn().serve(transport).await
    }
}
