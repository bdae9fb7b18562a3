//! WebSocket outbound channel
//!
//! Bridges the synchronous relay core to the socket writer task.

use crate::connection::{DeliveryError, OutboundChannel};
use crate::protocol::CloseCode;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Frame queued for the writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Text(String),
    Ping,
}

/// Outbound half of one WebSocket
///
/// Data frames go through a bounded queue. The close request travels on its
/// own channel so it still reaches the writer when the queue is full.
#[derive(Clone)]
pub(crate) struct WsOutbound {
    tx: mpsc::Sender<Frame>,
    open: Arc<AtomicBool>,
    close_tx: Arc<Mutex<Option<oneshot::Sender<CloseCode>>>>,
}

impl WsOutbound {
    /// Create the channel plus the receiving ends the writer task consumes
    pub(crate) fn channel(
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Frame>, oneshot::Receiver<CloseCode>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        let outbound = Self {
            tx,
            open: Arc::new(AtomicBool::new(true)),
            close_tx: Arc::new(Mutex::new(Some(close_tx))),
        };
        (outbound, rx, close_rx)
    }

    /// Queue a keep-alive ping
    pub(crate) fn ping(&self) -> Result<(), DeliveryError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(DeliveryError::Closed);
        }
        self.tx.try_send(Frame::Ping).map_err(DeliveryError::from)
    }
}

impl OutboundChannel for WsOutbound {
    fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(DeliveryError::Closed);
        }
        self.tx.try_send(Frame::Text(text)).map_err(DeliveryError::from)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    fn close(&self, code: CloseCode) {
        self.open.store(false, Ordering::Release);
        if let Some(close_tx) = self.close_tx.lock().take() {
            // Writer already gone if this fails
            let _ = close_tx.send(code);
        }
    }
}
