//! Legacy MCP HTTP+SSE client transport.
//!
//! The server announces a POST URL in an `endpoint` event on the long-lived
//! `GET` stream; requests are POSTed there and responses arrive as `message`
//! events on the stream.

use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::Url;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use rmcp::model::ServerJsonRpcMessage;
use rmcp::service::{RoleClient, RxJsonRpcMessage, TxJsonRpcMessage};
use rmcp::transport::Transport as RmcpTransport;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::error::MuxError;

const INBOUND_BUFFER: usize = 64;

/// Client half of an HTTP+SSE MCP connection.
pub struct SseClientTransport {
    http: reqwest::Client,
    post_url: Url,
    inbound: mpsc::Receiver<RxJsonRpcMessage<RoleClient>>,
    cancel: CancellationToken,
    _pump: DropGuard,
}

impl SseClientTransport {
    /// Open the event stream and wait for the server's `endpoint` event.
    pub async fn open(url: Url, headers: HeaderMap) -> Result<Self, MuxError> {
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let mut events = EventSource::new(http.get(url.clone())).map_err(|e| {
            MuxError::Stream(format!("SSE request for {url} cannot be opened: {e}"))
        })?;
        // A dropped stream ends the session; rmcp sees the closed transport.
        events.set_retry_policy(Box::new(Never));

        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        tokio::spawn(pump_events(events, endpoint_tx, inbound_tx, cancel.clone()));

        let announced = endpoint_rx.await.map_err(|_| {
            MuxError::Stream("SSE stream ended before the endpoint event".into())
        })??;
        let post_url = resolve_post_url(&url, &announced)?;
        debug!(stream = %url, post = %post_url, "SSE endpoint announced");

        Ok(Self {
            http,
            post_url,
            inbound: inbound_rx,
            cancel,
            _pump: guard,
        })
    }

    pub fn post_url(&self) -> &Url {
        &self.post_url
    }
}

impl RmcpTransport<RoleClient> for SseClientTransport {
    type Error = MuxError;

    fn send(
        &mut self,
        item: TxJsonRpcMessage<RoleClient>,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send + 'static {
        let http = self.http.clone();
        let url = self.post_url.clone();
        async move {
            let response = http.post(url).json(&item).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MuxError::Provider {
                    provider: "mcp".into(),
                    message: format!("SSE post returned HTTP {status}: {body}"),
                });
            }
            Ok(())
        }
    }

    async fn receive(&mut self) -> Option<RxJsonRpcMessage<RoleClient>> {
        self.inbound.recv().await
    }

    fn close(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send {
        self.cancel.cancel();
        self.inbound.close();
        std::future::ready(Ok(()))
    }
}

async fn pump_events(
    mut events: EventSource,
    endpoint_tx: oneshot::Sender<Result<String, MuxError>>,
    inbound: mpsc::Sender<RxJsonRpcMessage<RoleClient>>,
    cancel: CancellationToken,
) {
    let mut endpoint_tx = Some(endpoint_tx);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.next() => event,
        };
        let message = match event {
            Some(Ok(Event::Open)) => continue,
            Some(Ok(Event::Message(message))) => message,
            Some(Err(EventSourceError::StreamEnded)) | None => {
                debug!("SSE stream ended");
                break;
            }
            Some(Err(error)) => {
                let error = stream_error(error).await;
                match endpoint_tx.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(error));
                    }
                    None => warn!(%error, "SSE stream failed"),
                }
                break;
            }
        };

        match message.event.as_str() {
            "endpoint" => {
                if let Some(tx) = endpoint_tx.take() {
                    let _ = tx.send(Ok(message.data));
                }
            }
            "message" | "" => match serde_json::from_str::<ServerJsonRpcMessage>(&message.data) {
                Ok(message) => {
                    if inbound.send(message).await.is_err() {
                        break;
                    }
                }
                Err(error) => warn!(%error, "dropping malformed SSE message"),
            },
            other => debug!(event = other, "ignoring SSE event"),
        }
    }

    events.close();
}

async fn stream_error(error: EventSourceError) -> MuxError {
    match error {
        EventSourceError::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            MuxError::Stream(format!("SSE stream returned HTTP {status}: {body}"))
        }
        EventSourceError::InvalidContentType(content_type, _) => MuxError::Stream(format!(
            "SSE stream has content type {content_type:?}, expected text/event-stream"
        )),
        other => MuxError::Stream(format!("SSE stream failed: {other}")),
    }
}

/// Resolve the announced POST target against the stream URL.
///
/// The target must stay on the same origin as the stream.
fn resolve_post_url(stream_url: &Url, announced: &str) -> Result<Url, MuxError> {
    let post_url = stream_url.join(announced.trim()).map_err(|e| {
        MuxError::Stream(format!("Invalid SSE endpoint '{announced}': {e}"))
    })?;
    if post_url.origin() != stream_url.origin() {
        return Err(MuxError::Stream(format!(
            "SSE endpoint '{post_url}' is not on the origin of {stream_url}"
        )));
    }
    Ok(post_url)
}
