//! Test helpers for integration tests
//!
//! Provides utilities for spawning relay servers on ephemeral ports and
//! driving them with WebSocket and HTTP clients.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use relay_common::{AppConfig, AppResult};
use relay_gateway::{serve_with_shutdown, GatewayState};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long to wait for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
///
/// Dropping the server triggers a graceful shutdown.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    ws_path: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<AppResult<()>>,
}

impl TestServer {
    /// Start a new test server with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with(&[]).await
    }

    /// Start a test server with configuration overrides
    pub async fn start_with(overrides: &[(&str, &str)]) -> Result<Self> {
        let config = test_config(overrides)?;
        let ws_path = config.server.ws_path.clone();

        // Bind to an ephemeral port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = GatewayState::new(config);
        let handle = tokio::spawn(serve_with_shutdown(listener, state, async move {
            let _ = shutdown_rx.await;
        }));

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            ws_path,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.ws_path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Fire the shutdown signal without waiting for the server to stop
    pub fn begin_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Shut down and wait for the serve loop to return
    pub async fn shutdown(mut self) -> Result<()> {
        self.begin_shutdown();
        timeout(RECV_TIMEOUT, &mut self.handle)
            .await
            .context("server did not stop")???;
        Ok(())
    }
}

/// Create a test configuration
///
/// Built from the given overrides only, so the host environment never leaks in.
pub fn test_config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = HashMap::new();
    // The listener is bound separately; the port only has to validate
    vars.insert("PORT".to_string(), "3001".to_string());
    vars.insert("LOG_FORMAT".to_string(), "pretty".to_string());
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned())
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))
}

/// Assert response status and parse JSON body
pub async fn assert_json(response: Response, expected_status: StatusCode) -> Result<Value> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// What the client read next
#[derive(Debug)]
pub enum Incoming {
    /// A server envelope
    Event(Value),
    /// The connection closed, with the close code if one was sent
    Closed(Option<u16>),
}

/// WebSocket test client speaking the relay envelope
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connect to the server's WebSocket route
    pub async fn connect(server: &TestServer) -> Result<Self> {
        let (stream, _response) = connect_async(server.ws_url()).await?;
        Ok(Self { stream })
    }

    /// Connect and wait until the relay has registered the connection
    ///
    /// The upgrade response can arrive before the relay accepts the socket,
    /// so round-trip an unknown message type and swallow the error reply.
    pub async fn connect_registered(server: &TestServer) -> Result<Self> {
        let mut client = Self::connect(server).await?;
        client.send_envelope("ping", json!({})).await?;
        let reply = client.expect_event("error").await?;
        if reply["data"]["details"] != "ping" {
            bail!("unexpected registration reply: {reply}");
        }
        Ok(client)
    }

    /// Send a raw frame
    pub async fn send_message(&mut self, message: Message) -> Result<()> {
        self.stream.send(message).await?;
        Ok(())
    }

    /// Send an envelope with the given type and payload
    pub async fn send_envelope(&mut self, kind: &str, data: Value) -> Result<()> {
        let envelope = json!({"type": kind, "data": data, "timestamp": 0});
        self.send_message(Message::Text(envelope.to_string())).await
    }

    /// Send `set name`
    pub async fn set_name(&mut self, name: &str) -> Result<()> {
        self.send_envelope("set name", json!({ "name": name })).await
    }

    /// Send `set name` and consume the `name set` + `users list` replies
    pub async fn claim_name(&mut self, name: &str) -> Result<Value> {
        self.set_name(name).await?;
        self.expect_event("name set").await?;
        self.expect_event("users list").await
    }

    /// Send `chat message`
    pub async fn chat(&mut self, message: &str) -> Result<()> {
        self.send_envelope("chat message", json!({ "message": message }))
            .await
    }

    /// Read the next envelope or close
    pub async fn recv(&mut self) -> Result<Incoming> {
        loop {
            let next = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?;

            match next {
                Some(Ok(Message::Text(text))) => return Ok(Incoming::Event(serde_json::from_str(&text)?)),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Incoming::Event(serde_json::from_slice(&bytes)?));
                }
                Some(Ok(Message::Close(frame))) => {
                    return Ok(Incoming::Closed(frame.map(|f| u16::from(f.code))));
                }
                // Transport errors after the peer hung up count as a close
                Some(Err(_)) | None => return Ok(Incoming::Closed(None)),
                Some(Ok(_)) => {}
            }
        }
    }

    /// Read the next envelope, failing on close
    pub async fn recv_event(&mut self) -> Result<Value> {
        match self.recv().await? {
            Incoming::Event(event) => Ok(event),
            Incoming::Closed(code) => bail!("connection closed ({code:?})"),
        }
    }

    /// Read the next envelope and check its type
    pub async fn expect_event(&mut self, kind: &str) -> Result<Value> {
        let event = self.recv_event().await?;
        if event["type"] != kind {
            bail!("expected {kind:?}, got {event}");
        }
        Ok(event)
    }

    /// Skip envelopes until the connection closes, returning the close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        loop {
            if let Incoming::Closed(code) = self.recv().await? {
                return Ok(code);
            }
        }
    }

    /// Fail if any envelope arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        let deadline = Instant::now() + window;
        loop {
            match timeout_at(deadline, self.stream.next()).await {
                Err(_) => return Ok(()),
                Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected event: {text}"),
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => bail!("transport error: {e}"),
                Ok(None) => bail!("connection closed"),
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Extract the display names from a `users list` event
pub fn roster_names(event: &Value) -> Vec<String> {
    event["data"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
