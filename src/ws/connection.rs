//! Watch connection loop.
//!
//! Bridges one WebSocket to one broker subscription. A reader task
//! watches for the client going away and cancels the subscription; the
//! broker drives the writer half through [`WatchSink`].

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;

use super::messages::WatchMessage;
use crate::domain::{Broker, WatchEvent, WatchSink};
use crate::error::LvmdError;

/// Writer half of a watch connection. Numbers events as it sends them.
#[derive(Debug)]
struct WsSink {
    tx: SplitSink<WebSocket, Message>,
    sequence: u64,
}

#[async_trait]
impl WatchSink for WsSink {
    async fn send(&mut self, event: WatchEvent) -> Result<(), LvmdError> {
        let msg = WatchMessage::new(self.sequence, event);
        let json =
            serde_json::to_string(&msg).map_err(|e| LvmdError::Internal(e.to_string()))?;
        self.tx
            .send(Message::text(json))
            .await
            .map_err(|e| LvmdError::TransportFailure(e.to_string()))?;
        self.sequence = self.sequence.saturating_add(1);
        Ok(())
    }
}

/// Serves inventory events on `socket` until the client disconnects or
/// `cancel` fires.
pub async fn run_watch(socket: WebSocket, broker: Broker, cancel: CancellationToken) {
    let (ws_tx, mut ws_rx) = socket.split();

    let reader_cancel = cancel.clone();
    let reader = tokio::spawn(async move {
        loop {
            match ws_rx.next().await {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
        reader_cancel.cancel();
    });

    let mut sink = WsSink {
        tx: ws_tx,
        sequence: 0,
    };
    match broker.watch(&mut sink, cancel).await {
        Ok(()) => {
            // Client may already be gone.
            let _ = sink.tx.close().await;
        }
        Err(err) => tracing::debug!(error = %err, "watch connection dropped"),
    }

    reader.abort();
    tracing::debug!(events = sink.sequence, "ws watch connection closed");
}
