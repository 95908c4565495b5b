use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::EndpointConfig;
use crate::error::MuxError;

use super::schema::{MCPToolCallResult, MCPToolSchema};
use super::session::{SessionConnector, SessionState, ToolSession};

pub(crate) struct MockSession {
    endpoint: String,
    tools: Vec<String>,
    list_error: Option<String>,
    disconnect_hangs: bool,
    disconnect_error: Option<String>,
    pub(crate) disconnects: Arc<AtomicUsize>,
    pub(crate) calls: Arc<Mutex<Vec<(String, Value)>>>,
    state: Mutex<SessionState>,
}

impl MockSession {
    pub(crate) fn new(endpoint: &str, tools: &[&str]) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            tools: tools.iter().map(|name| name.to_string()).collect(),
            list_error: None,
            disconnect_hangs: false,
            disconnect_error: None,
            disconnects: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            state: Mutex::new(SessionState::Live),
        }
    }

    pub(crate) fn failing_discovery(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_owned());
        self
    }

    pub(crate) fn hanging_disconnect(mut self) -> Self {
        self.disconnect_hangs = true;
        self
    }

    pub(crate) fn failing_disconnect(mut self, message: &str) -> Self {
        self.disconnect_error = Some(message.to_owned());
        self
    }

    pub(crate) fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSession for MockSession {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    async fn list_tools(&self) -> Result<Vec<MCPToolSchema>, MuxError> {
        if let Some(message) = &self.list_error {
            return Err(MuxError::Stream(message.clone()));
        }
        Ok(self
            .tools
            .iter()
            .map(|name| MCPToolSchema {
                name: name.clone(),
                description: Some(format!("{name} from {}", self.endpoint)),
                input_schema: json!({ "type": "object", "properties": {} }),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<MCPToolCallResult, MuxError> {
        let arguments = arguments.map(Value::Object).unwrap_or(Value::Null);
        self.calls
            .lock()
            .unwrap()
            .push((name.to_owned(), arguments.clone()));
        Ok(MCPToolCallResult {
            structured_content: Some(json!({
                "endpoint": self.endpoint,
                "tool": name,
                "arguments": arguments,
            })),
            text_content: None,
            content: Vec::new(),
        })
    }

    async fn disconnect(&self) -> Result<(), MuxError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = SessionState::Disconnecting;
        if self.disconnect_hangs {
            std::future::pending::<()>().await;
        }
        *self.state.lock().unwrap() = SessionState::Closed;
        match &self.disconnect_error {
            Some(message) => Err(MuxError::Stream(message.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) enum MockEndpoint {
    Session(Arc<MockSession>),
    Delayed(Arc<MockSession>, Duration),
    Refuse(String),
    Hang,
}

#[derive(Default)]
pub(crate) struct MockConnector {
    endpoints: HashMap<String, MockEndpoint>,
    pub(crate) connects: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    pub(crate) fn with_session(mut self, session: Arc<MockSession>) -> Self {
        self.endpoints.insert(
            session.endpoint().to_owned(),
            MockEndpoint::Session(session),
        );
        self
    }

    /// Hand out `session` only after `delay` has passed.
    pub(crate) fn with_delayed_session(mut self, session: Arc<MockSession>, delay: Duration) -> Self {
        self.endpoints.insert(
            session.endpoint().to_owned(),
            MockEndpoint::Delayed(session, delay),
        );
        self
    }

    pub(crate) fn with_refusal(mut self, url: &str, message: &str) -> Self {
        self.endpoints
            .insert(url.to_owned(), MockEndpoint::Refuse(message.to_owned()));
        self
    }

    pub(crate) fn with_hang(mut self, url: &str) -> Self {
        self.endpoints.insert(url.to_owned(), MockEndpoint::Hang);
        self
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn ToolSession>, MuxError> {
        self.connects.lock().unwrap().push(endpoint.url.clone());
        match self.endpoints.get(&endpoint.url) {
            Some(MockEndpoint::Session(session)) => Ok(Arc::clone(session) as Arc<dyn ToolSession>),
            Some(MockEndpoint::Delayed(session, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(Arc::clone(session) as Arc<dyn ToolSession>)
            }
            Some(MockEndpoint::Refuse(message)) => {
                Err(MuxError::connection(&endpoint.url, message.clone()))
            }
            Some(MockEndpoint::Hang) => std::future::pending().await,
            None => Err(MuxError::connection(&endpoint.url, "unknown endpoint")),
        }
    }
}
