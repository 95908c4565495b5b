//! Shared test helpers: scripted MCP servers for both wire transports.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub fn mcp_tools_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string"
            }
        }
    })
}

/// JSON-RPC reply for the MCP methods the aggregator uses; `None` for notifications.
pub fn mcp_response(
    server_name: &str,
    tools: &[(&str, &str)],
    body: &serde_json::Value,
) -> Option<serde_json::Value> {
    let method = body.get("method").and_then(|value| value.as_str()).unwrap_or_default();
    let id = body.get("id").cloned()?;

    let result = match method {
        "initialize" => json!({
            "protocolVersion": "2025-03-26",
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": server_name,
                "version": "0.1.0"
            }
        }),
        "tools/list" => {
            let tool_definitions: Vec<_> = tools
                .iter()
                .map(|(tool_name, description)| {
                    json!({
                        "name": tool_name,
                        "description": description,
                        "inputSchema": mcp_tools_schema()
                    })
                })
                .collect();
            json!({
                "tools": tool_definitions,
                "nextCursor": null
            })
        }
        "tools/call" => {
            let called_tool = body
                .get("params")
                .and_then(|params| params.get("name"))
                .and_then(|name| name.as_str())
                .unwrap_or_default();
            let arguments = body
                .get("params")
                .and_then(|params| params.get("arguments"))
                .cloned()
                .unwrap_or_else(|| json!({}));
            json!({
                "content": [{ "type": "text", "text": format!("{server_name}:{called_tool}") }],
                "structuredContent": {
                    "server": server_name,
                    "tool": called_tool,
                    "arguments": arguments
                },
                "isError": false
            })
        }
        _ => serde_json::Value::Null,
    };

    Some(json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    }))
}

/// Responds to the MCP JSON-RPC methods the aggregator uses.
pub fn mock_mcp_handler(
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |request: &Request| {
        let body: serde_json::Value = request.body_json().unwrap_or_else(|_| json!({}));
        match mcp_response(server_name, tools, &body) {
            Some(reply) => ResponseTemplate::new(200).set_body_json(reply),
            None => ResponseTemplate::new(202),
        }
    }
}

/// Start a server exposing `tools` at `/mcp`.
pub async fn start_mcp_server(
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(mock_mcp_handler(server_name, tools))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    server
}

pub fn request_methods(requests: &[Request]) -> HashSet<String> {
    requests
        .iter()
        .filter_map(|request| {
            request
                .body_json::<serde_json::Value>()
                .ok()
                .and_then(|body| {
                    body.get("method")
                        .and_then(|method| method.as_str())
                        .map(str::to_string)
                })
        })
        .collect()
}

pub fn request_headers_match(requests: &[Request], header: &str, expected: &str) -> bool {
    requests.iter().all(|request| {
        request
            .headers
            .get(header)
            .and_then(|value| value.to_str().ok())
            == Some(expected)
    })
}

/// One HTTP request seen by [`SseMcpServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: serde_json::Value,
}

type EventSender = Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>;

/// Legacy HTTP+SSE MCP server: `GET /sse` streams events, `POST /messages`
/// accepts requests whose replies are pushed onto the stream.
pub struct SseMcpServer {
    address: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SseMcpServer {
    pub fn stream_url(&self) -> String {
        format!("http://{}/sse", self.address)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for SseMcpServer {
    fn drop(&mut self) {
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }
}

pub async fn start_sse_mcp_server(
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
) -> SseMcpServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = listener.local_addr().expect("listener should have an address");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let tasks = Arc::new(Mutex::new(Vec::new()));
    let events: EventSender = Arc::new(Mutex::new(None));

    let accept = {
        let requests = Arc::clone(&requests);
        let tasks = Arc::clone(&tasks);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let connection = tokio::spawn(serve_sse_connection(
                    socket,
                    server_name,
                    tools,
                    Arc::clone(&requests),
                    Arc::clone(&events),
                ));
                tasks.lock().unwrap().push(connection);
            }
        })
    };
    tasks.lock().unwrap().push(accept);

    SseMcpServer {
        address,
        requests,
        tasks,
    }
}

async fn serve_sse_connection(
    socket: TcpStream,
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    events: EventSender,
) {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    while let Some(request) = read_request(&mut reader).await {
        requests.lock().unwrap().push(request.clone());

        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/sse") => {
                let (tx, mut rx) = mpsc::unbounded_channel::<String>();
                *events.lock().unwrap() = Some(tx);
                let head = concat!(
                    "HTTP/1.1 200 OK\r\n",
                    "content-type: text/event-stream\r\n",
                    "cache-control: no-cache\r\n",
                    "connection: close\r\n\r\n",
                    "event: endpoint\n",
                    "data: /messages?sessionId=s1\n\n",
                );
                if writer.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let _ = writer.flush().await;
                while let Some(frame) = rx.recv().await {
                    if writer.write_all(frame.as_bytes()).await.is_err() {
                        return;
                    }
                    let _ = writer.flush().await;
                }
                return;
            }
            ("POST", "/messages") => {
                if let Some(reply) = mcp_response(server_name, tools, &request.body) {
                    let sender = events.lock().unwrap().clone();
                    if let Some(sender) = sender {
                        let _ = sender.send(format!("event: message\ndata: {reply}\n\n"));
                    }
                }
                let accepted = "HTTP/1.1 202 Accepted\r\ncontent-length: 0\r\n\r\n";
                if writer.write_all(accepted.as_bytes()).await.is_err() {
                    return;
                }
            }
            _ => {
                let missing = "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n";
                if writer.write_all(missing.as_bytes()).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn read_request<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<RecordedRequest> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).await.ok()?;

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    })
}
