//! WebSocket handler
//!
//! Upgrades HTTP requests and pumps frames between the socket and the relay.

use super::outbound::{Frame, WsOutbound};
use crate::connection::{Connection, ConnectionId, ConnectionLifecycle};
use crate::protocol::CloseCode;
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, timeout, MissedTickBehavior};

/// How long the writer gets to flush the close frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest frame the transport will buffer, relative to the relay limit
const TRANSPORT_SIZE_FACTOR: usize = 2;

/// WebSocket relay handler
pub async fn ws_handler(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> Response {
    if state.lifecycle().is_full() {
        tracing::warn!(
            limit = state.lifecycle().max_connections(),
            "Upgrade refused, connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "server full").into_response();
    }

    // Oversized frames are closed with 1009 by the reader, so the transport
    // cap only has to sit above the relay limit.
    let max_message_bytes = state.config().websocket.max_message_bytes;
    ws.max_message_size(max_message_bytes.saturating_mul(TRANSPORT_SIZE_FACTOR))
        .on_upgrade(|socket| handle_socket(state, socket))
}

/// Time of the most recent inbound frame
struct Liveness {
    started: Instant,
    last_seen_ms: AtomicU64,
}

impl Liveness {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            last_seen_ms: AtomicU64::new(0),
        }
    }

    fn touch(&self) {
        let now = self.started.elapsed().as_millis() as u64;
        self.last_seen_ms.store(now, Ordering::Relaxed);
    }

    fn silence(&self) -> Duration {
        let last_seen = Duration::from_millis(self.last_seen_ms.load(Ordering::Relaxed));
        self.started.elapsed().saturating_sub(last_seen)
    }
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let ws_config = state.config().websocket.clone();
    let lifecycle = state.lifecycle().clone();

    let (outbound, frames, close_rx) = WsOutbound::channel(ws_config.outbound_buffer);
    let pinger = outbound.clone();
    let (mut ws_sink, ws_stream) = socket.split();

    let connection = match lifecycle.accept(outbound) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!(error = %e, "Closing socket accepted over capacity");
            let _ = ws_sink.send(close_message(CloseCode::ServerFull)).await;
            return;
        }
    };
    let connection_id = connection.id().clone();
    let liveness = Arc::new(Liveness::new());

    let mut send_task = tokio::spawn(write_frames(
        ws_sink,
        frames,
        close_rx,
        connection_id.clone(),
    ));

    let mut recv_task = tokio::spawn(read_frames(
        ws_stream,
        lifecycle.clone(),
        connection.clone(),
        ws_config.max_message_bytes,
        liveness.clone(),
    ));

    let mut heartbeat_task = tokio::spawn(heartbeat(
        lifecycle.clone(),
        connection_id.clone(),
        pinger,
        liveness,
        Duration::from_millis(ws_config.heartbeat_interval_ms),
        Duration::from_millis(ws_config.heartbeat_timeout_ms),
    ));

    // Wait for any task to complete
    let read_error = tokio::select! {
        result = &mut recv_task => match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(e.to_string()),
        },
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            None
        }
        _ = &mut heartbeat_task => {
            tracing::debug!(connection_id = %connection_id, "Heartbeat task ended");
            None
        }
    };

    recv_task.abort();
    heartbeat_task.abort();

    // No-ops if the connection was already force-disconnected
    match read_error {
        Some(error) => lifecycle.on_error(&connection_id, &error),
        None => lifecycle.on_close(&connection_id),
    };
    connection.close_transport(CloseCode::Normal);

    if timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Writer did not finish, aborting");
        send_task.abort();
    }
}

/// Read frames from the socket and feed them to the relay in order
async fn read_frames(
    mut ws_stream: SplitStream<WebSocket>,
    lifecycle: ConnectionLifecycle,
    connection: Arc<Connection>,
    max_message_bytes: usize,
    liveness: Arc<Liveness>,
) -> Result<(), axum::Error> {
    while let Some(msg) = ws_stream.next().await {
        let msg = msg?;
        liveness.touch();

        let payload: &[u8] = match &msg {
            Message::Text(text) => text.as_bytes(),
            Message::Binary(bytes) => bytes,
            Message::Ping(_) | Message::Pong(_) => {
                tracing::trace!(connection_id = %connection.id(), "Keep-alive frame received");
                continue;
            }
            Message::Close(frame) => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    code = ?frame.as_ref().map(|f| f.code),
                    "Client closed connection"
                );
                return Ok(());
            }
        };

        if payload.len() > max_message_bytes {
            tracing::warn!(
                connection_id = %connection.id(),
                size = payload.len(),
                limit = max_message_bytes,
                "Frame exceeds size limit"
            );
            lifecycle.force_disconnect(connection.id(), CloseCode::MessageTooBig);
            return Ok(());
        }

        lifecycle.on_message(&connection, payload);
    }

    Ok(())
}

/// Write queued frames to the socket until a close is requested
async fn write_frames(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut frames: mpsc::Receiver<Frame>,
    mut close_rx: oneshot::Receiver<CloseCode>,
    connection_id: ConnectionId,
) {
    loop {
        let message = tokio::select! {
            biased;
            code = &mut close_rx => {
                if let Ok(code) = code {
                    tracing::debug!(connection_id = %connection_id, code = %code, "Sending close frame");
                    let _ = ws_sink.send(close_message(code)).await;
                }
                break;
            }
            frame = frames.recv() => match frame {
                Some(Frame::Text(text)) => Message::Text(text),
                Some(Frame::Ping) => Message::Ping(Vec::new()),
                None => break,
            },
        };

        if ws_sink.send(message).await.is_err() {
            tracing::debug!(connection_id = %connection_id, "Failed to write to WebSocket");
            break;
        }
    }

    let _ = ws_sink.close().await;
}

/// Ping the peer and disconnect it once it has been silent too long
async fn heartbeat(
    lifecycle: ConnectionLifecycle,
    connection_id: ConnectionId,
    pinger: WsOutbound,
    liveness: Arc<Liveness>,
    every: Duration,
    silence_limit: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let silence = liveness.silence();
        if silence >= silence_limit {
            tracing::warn!(
                connection_id = %connection_id,
                silent_ms = silence.as_millis() as u64,
                "Connection timed out (no traffic)"
            );
            lifecycle.force_disconnect(&connection_id, CloseCode::HeartbeatTimeout);
            break;
        }

        if let Err(e) = pinger.ping() {
            tracing::trace!(connection_id = %connection_id, error = %e, "Ping not queued");
        }
    }
}

fn close_message(code: CloseCode) -> Message {
    Message::Close(Some(CloseFrame {
        code: code.as_u16(),
        reason: code.description().into(),
    }))
}
