//! Stream transport: request/response over length-prefixed JSON frames
//!
//! Requests carry an id and may settle in any order. Two background tasks
//! own the connection:
//! - a writer task draining an outbound frame queue
//! - a reader task routing `Resolve`/`Reject` frames to the waiting caller
//!   and `betResult` events to broadcast subscribers

use crate::frame::{AsyncReader, AsyncWriter, MAX_FRAME_LEN};
use crate::preview;
use crate::protocol::{HostFrame, deserialize, serialize};
use crate::transport::HostTransport;
use async_trait::async_trait;
use game_manager_core::{BET_RESULT_EVENT, BetResult, BridgeError, Operation, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type Reply = Result<Value>;

/// Configuration for connecting to a host over TCP
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Host to connect to (default: 127.0.0.1)
    pub host: String,
    /// Port the host listens on (default: 19740)
    pub port: u16,
    /// Bounds connecting only, never a request
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 19740,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl StreamConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Requests awaiting a reply, keyed by request id
#[derive(Default)]
struct Pending {
    waiters: HashMap<u64, oneshot::Sender<Reply>>,
    /// Set once the connection is lost; later requests fail immediately
    closed: bool,
}

type SharedPending = Arc<Mutex<Pending>>;

/// Game side of a stream connection to the host
pub struct StreamTransport {
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: SharedPending,
    next_id: AtomicU64,
    bet_results_tx: broadcast::Sender<BetResult>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
}

impl StreamTransport {
    /// Start the background tasks for an established connection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncReader + 'static,
        W: AsyncWriter + 'static,
    {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (bet_results_tx, _) = broadcast::channel(64);
        let pending = SharedPending::default();

        let reader_handle = tokio::spawn(reader_task(
            reader,
            pending.clone(),
            bet_results_tx.clone(),
        ));
        let writer_handle = tokio::spawn(writer_task(writer, outbound_rx, pending.clone()));

        Self {
            outbound_tx,
            pending,
            next_id: AtomicU64::new(1),
            bet_results_tx,
            reader_handle,
            writer_handle,
        }
    }

    /// Connect to a host over TCP
    pub async fn connect_tcp(config: &StreamConfig) -> Result<Self> {
        let (reader, writer) = crate::tcp::connect(config).await?;
        info!("Connected to host at {}", config.addr());
        Ok(Self::new(reader, writer))
    }

    /// Connect to a host over a Unix domain socket
    #[cfg(unix)]
    pub async fn connect_unix(path: &str) -> Result<Self> {
        let (reader, writer) = crate::unix::connect(path).await?;
        info!("Connected to host at {}", path);
        Ok(Self::new(reader, writer))
    }

    /// Number of requests still waiting for the host
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().map(|p| p.waiters.len()).unwrap_or(0)
    }

    /// Serialize a frame, refusing bodies the framing cannot carry
    fn encode(frame: &HostFrame) -> Result<Vec<u8>> {
        let data = serialize(frame)?;
        if data.len() > MAX_FRAME_LEN {
            return Err(BridgeError::Ipc(format!(
                "Message too large: {} bytes",
                data.len()
            )));
        }
        Ok(data)
    }

    fn enqueue(&self, data: Vec<u8>) -> Result<()> {
        let json = String::from_utf8_lossy(&data);
        debug!("[Game→Host] len={} json={}", data.len(), preview(&json));

        self.outbound_tx
            .send(data)
            .map_err(|_| BridgeError::Ipc("Writer task not running".into()))
    }

    fn register(&self, id: u64) -> Result<oneshot::Receiver<Reply>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let mut pending = self
            .pending
            .lock()
            .map_err(|_| BridgeError::Ipc("Pending request table poisoned".into()))?;
        if pending.closed {
            return Err(BridgeError::Ipc("Connection lost".into()));
        }
        pending.waiters.insert(id, reply_tx);
        Ok(reply_rx)
    }

    fn forget(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.waiters.remove(&id);
        }
    }
}

#[async_trait]
impl HostTransport for StreamTransport {
    async fn send(&self, op: Operation, payload: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let data = Self::encode(&HostFrame::Request {
            id: Some(id),
            method: op.as_str().to_string(),
            data: payload.unwrap_or(Value::Null),
        })?;

        // Register before writing so a fast reply always finds its waiter
        let reply_rx = self.register(id)?;
        if let Err(e) = self.enqueue(data) {
            self.forget(id);
            return Err(e);
        }

        reply_rx.await.map_err(|_| BridgeError::HostGone)?
    }

    fn notify(&self, op: Operation, payload: Option<Value>) -> Result<()> {
        let data = Self::encode(&HostFrame::Request {
            id: None,
            method: op.as_str().to_string(),
            data: payload.unwrap_or(Value::Null),
        })?;
        self.enqueue(data)
    }

    fn subscribe_bet_results(&self) -> Option<broadcast::Receiver<BetResult>> {
        Some(self.bet_results_tx.subscribe())
    }
}

impl Drop for StreamTransport {
    fn drop(&mut self) {
        self.reader_handle.abort();
        self.writer_handle.abort();
    }
}

async fn writer_task<W: AsyncWriter>(
    mut writer: W,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: SharedPending,
) {
    while let Some(data) = outbound_rx.recv().await {
        if let Err(e) = writer.write_message(&data).await {
            error!("Writer task failed: {}", e);
            fail_all(&pending);
            break;
        }
    }
    debug!("Writer task exiting");
}

/// Background reader task
///
/// Routes replies to pending requests by id and pushes `betResult` events to
/// subscribers. When the connection fails every pending request is failed.
async fn reader_task<R: AsyncReader>(
    mut reader: R,
    pending: SharedPending,
    bet_results_tx: broadcast::Sender<BetResult>,
) {
    loop {
        let data = match reader.read_message().await {
            Ok(data) => data,
            Err(e) => {
                error!("Reader task failed: {}", e);
                break;
            }
        };

        let json = String::from_utf8_lossy(&data);
        debug!("[Host→Game] len={} json={}", data.len(), preview(&json));

        let frame = match deserialize(&data) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to deserialize frame: {}", e);
                continue;
            }
        };

        match frame {
            HostFrame::Resolve { id, value } => settle(&pending, id, Ok(value)),
            HostFrame::Reject { id, reason } => {
                settle(&pending, id, Err(BridgeError::Rejected(reason)))
            }
            HostFrame::Event { name, detail } if name == BET_RESULT_EVENT => {
                match serde_json::from_value::<BetResult>(detail) {
                    Ok(result) => {
                        // Ignore send errors (no subscribers)
                        let _ = bet_results_tx.send(result);
                    }
                    Err(e) => warn!("Malformed betResult event: {}", e),
                }
            }
            HostFrame::Event { name, .. } => {
                warn!("Ignoring unknown event from host: {}", name);
            }
            HostFrame::Request { method, .. } => {
                warn!("Host sent a request frame ({}), ignoring", method);
            }
        }
    }

    fail_all(&pending);
}

/// Connection lost: fail everything still waiting and refuse new requests
fn fail_all(pending: &SharedPending) {
    if let Ok(mut pending) = pending.lock() {
        pending.closed = true;
        for (_, reply_tx) in pending.waiters.drain() {
            let _ = reply_tx.send(Err(BridgeError::Ipc("Connection lost".into())));
        }
    }
}

fn settle(pending: &SharedPending, id: u64, reply: Reply) {
    let waiter = pending.lock().ok().and_then(|mut p| p.waiters.remove(&id));
    match waiter {
        Some(reply_tx) => {
            let _ = reply_tx.send(reply);
        }
        None => warn!("Received reply for unknown request id {}", id),
    }
}
