//! Serving games over stream connections

use crate::handler::HostHandler;
use game_manager_bridge::{AsyncReader, AsyncWriter, HostFrame, deserialize, serialize, tcp};
use game_manager_core::{BET_RESULT_EVENT, BetResult, BridgeError, Operation, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pushes unsolicited notifications to one connected game
#[derive(Debug, Clone)]
pub struct HostEvents {
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl HostEvents {
    /// Push a `betResult` notification
    pub fn push_bet_result(&self, result: &BetResult) -> Result<()> {
        let frame = HostFrame::Event {
            name: BET_RESULT_EVENT.to_string(),
            detail: serde_json::to_value(result)?,
        };
        self.push(&frame)
    }

    fn push(&self, frame: &HostFrame) -> Result<()> {
        let data = serialize(frame)?;
        self.outbound_tx
            .send(data)
            .map_err(|_| BridgeError::Ipc("Game connection closed".into()))
    }
}

/// Serve one game connection.
///
/// Requests are answered in arrival order. Returns a handle for pushing
/// events and the task running the connection, which ends when the game
/// disconnects.
pub fn serve_stream<R, W, H>(reader: R, writer: W, handler: H) -> (HostEvents, JoinHandle<()>)
where
    R: AsyncReader + 'static,
    W: AsyncWriter + 'static,
    H: HostHandler,
{
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let events = HostEvents { outbound_tx };

    tokio::spawn(writer_task(writer, outbound_rx));
    let handle = tokio::spawn(request_loop(reader, events.clone(), handler));

    (events, handle)
}

/// Accept games on `listener`, forwarding every result sent on
/// `bet_results` to each connected game
pub async fn serve_tcp<H>(
    listener: TcpListener,
    handler: Arc<H>,
    bet_results: broadcast::Sender<BetResult>,
) -> Result<()>
where
    H: HostHandler,
{
    info!(
        "Host listening on {}",
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default()
    );

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| BridgeError::Ipc(format!("Accept failed: {}", e)))?;
        info!("Game connected from {}", peer);

        let (reader, writer) = match tcp::split(stream) {
            Ok(halves) => halves,
            Err(e) => {
                warn!("Dropping connection from {}: {}", peer, e);
                continue;
            }
        };

        // Subscribe before the game can see any reply
        let mut results_rx = bet_results.subscribe();
        let (events, mut connection) = serve_stream(reader, writer, handler.clone());

        // Forward pushed results until the game goes away
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut connection => break,
                    received = results_rx.recv() => match received {
                        Ok(result) => {
                            if let Err(e) = events.push_bet_result(&result) {
                                debug!("Stopped forwarding results to {}: {}", peer, e);
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Result forwarder for {} lagged, missed {} results", peer, n);
                        }
                    },
                }
            }
            info!("Game {} disconnected", peer);
        });
    }
}

async fn writer_task<W: AsyncWriter>(mut writer: W, mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(data) = outbound_rx.recv().await {
        if let Err(e) = writer.write_message(&data).await {
            error!("Failed to write to game: {}", e);
            break;
        }
    }
}

async fn request_loop<R: AsyncReader, H: HostHandler>(mut reader: R, events: HostEvents, handler: H) {
    loop {
        let data = match reader.read_message().await {
            Ok(data) => data,
            Err(e) => {
                debug!("Game connection ended: {}", e);
                break;
            }
        };

        let (id, method, payload) = match deserialize(&data) {
            Ok(HostFrame::Request { id, method, data }) => (id, method, data),
            Ok(other) => {
                warn!("Ignoring non-request frame from game: {:?}", other);
                continue;
            }
            Err(e) => {
                error!("Failed to deserialize frame: {}", e);
                continue;
            }
        };

        let reply = match method.parse::<Operation>() {
            Ok(op) => handler.handle(op, payload).await,
            Err(e) => Err(Value::String(e.to_string())),
        };

        let Some(id) = id else {
            if let Err(reason) = reply {
                warn!("Fire-and-forget {} failed: {}", method, reason);
            }
            continue;
        };

        let frame = match reply {
            Ok(value) => HostFrame::Resolve { id, value },
            Err(reason) => HostFrame::Reject { id, reason },
        };
        if events.push(&frame).is_err() {
            break;
        }
    }
}
