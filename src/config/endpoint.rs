//! Endpoint configuration for remote MCP servers.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bon::Builder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MuxError;

/// Transports mcpmux knows how to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SupportedTransport {
    /// Legacy MCP HTTP+SSE: long-lived event stream plus a POST endpoint.
    #[strum(to_string = "stream", serialize = "sse")]
    Stream,
    /// MCP streamable HTTP.
    Http,
}

/// Transport kind as supplied by the caller.
///
/// Unknown kinds are kept verbatim so the failure surfaces as a connection
/// error for that one endpoint instead of rejecting the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportKind {
    Supported(SupportedTransport),
    Unrecognized(String),
}

impl TransportKind {
    pub const STREAM: Self = Self::Supported(SupportedTransport::Stream);
    pub const HTTP: Self = Self::Supported(SupportedTransport::Http);

    pub fn supported(&self) -> Option<SupportedTransport> {
        match self {
            Self::Supported(kind) => Some(*kind),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<String> for TransportKind {
    fn from(raw: String) -> Self {
        match SupportedTransport::from_str(raw.trim()) {
            Ok(kind) => Self::Supported(kind),
            Err(_) => Self::Unrecognized(raw),
        }
    }
}

impl From<&str> for TransportKind {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<TransportKind> for String {
    fn from(kind: TransportKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supported(kind) => write!(f, "{kind}"),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// One `key: value` header attached to every exchange with an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl HeaderPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Connection settings for one remote MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[builder(into)]
    pub url: String,
    #[builder(into)]
    #[serde(rename = "type", alias = "transport")]
    pub transport: TransportKind,
    #[builder(default)]
    #[serde(default)]
    pub headers: Vec<HeaderPair>,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>, transport: impl Into<TransportKind>) -> Self {
        Self {
            url: url.into(),
            transport: transport.into(),
            headers: Vec::new(),
        }
    }

    /// Append a header; later duplicates win when the map is built.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderPair::new(key, value));
        self
    }

    /// Build the HTTP header map applied to every request.
    ///
    /// Pairs with an empty key are skipped. Duplicate keys resolve last-write-wins.
    pub fn header_map(&self) -> Result<HeaderMap, MuxError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for pair in &self.headers {
            let key = pair.key.trim();
            if key.is_empty() {
                continue;
            }
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                MuxError::Configuration(format!("Invalid header name '{key}': {e}"))
            })?;
            let value = HeaderValue::from_str(&pair.value).map_err(|e| {
                MuxError::Configuration(format!("Invalid value for header '{key}': {e}"))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }

    /// Parse and validate the endpoint URL.
    pub fn parsed_url(&self) -> Result<reqwest::Url, MuxError> {
        let raw = self.url.trim();
        if raw.is_empty() {
            return Err(MuxError::Configuration("Endpoint URL must not be empty".into()));
        }
        reqwest::Url::parse(raw)
            .map_err(|e| MuxError::Configuration(format!("Invalid endpoint URL '{raw}': {e}")))
    }
}

/// On-disk list of endpoints.
///
/// ```toml
/// [[endpoints]]
/// url = "https://tools.example.com/mcp"
/// type = "http"
/// headers = [{ key = "Authorization", value = "Bearer abc" }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsFile {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl EndpointsFile {
    pub fn parse(raw: &str) -> Result<Self, MuxError> {
        let file: Self = toml::from_str(raw)?;
        for (position, endpoint) in file.endpoints.iter().enumerate() {
            if endpoint.url.trim().is_empty() {
                return Err(MuxError::Configuration(format!(
                    "Endpoint #{position} has an empty url"
                )));
            }
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, MuxError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }
}
