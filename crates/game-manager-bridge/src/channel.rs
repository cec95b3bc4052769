//! In-process event channel transport
//!
//! Every outbound call becomes a [`HostEvent`] carrying the payload and a
//! [`Responder`]. The host answers by calling exactly one of
//! [`Responder::resolve`] or [`Responder::reject`]; both consume the
//! responder so a request settles at most once.

use crate::preview;
use crate::transport::HostTransport;
use async_trait::async_trait;
use game_manager_core::{BetResult, BridgeError, Operation, Result};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

type Reply = std::result::Result<Value, Value>;

/// Capacity of the `betResult` broadcast channel
const BET_RESULT_CAPACITY: usize = 64;

/// Completion callbacks attached to a host event
#[derive(Debug)]
pub struct Responder(oneshot::Sender<Reply>);

impl Responder {
    /// Fulfil the request with a response value
    pub fn resolve(self, value: Value) {
        // The caller may have stopped waiting (fire-and-forget)
        let _ = self.0.send(Ok(value));
    }

    /// Fail the request with a reason passed through to the caller
    pub fn reject(self, reason: Value) {
        let _ = self.0.send(Err(reason));
    }

    /// Whether anyone is still waiting on this reply
    pub fn is_awaited(&self) -> bool {
        !self.0.is_closed()
    }
}

/// A named notification delivered to the host: `{ data, resolve, reject }`
#[derive(Debug)]
pub struct HostEvent {
    pub op: Operation,
    pub data: Option<Value>,
    pub reply: Responder,
}

impl HostEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        self.op.as_str()
    }
}

/// Game side of the event channel
#[derive(Debug, Clone)]
pub struct EventTransport {
    events_tx: mpsc::UnboundedSender<HostEvent>,
    bet_results_tx: broadcast::Sender<BetResult>,
}

/// Host side of the event channel
#[derive(Debug)]
pub struct HostEndpoint {
    events_rx: mpsc::UnboundedReceiver<HostEvent>,
    bet_results_tx: broadcast::Sender<BetResult>,
}

/// Create a connected transport / host endpoint pair
pub fn event_channel() -> (EventTransport, HostEndpoint) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (bet_results_tx, _) = broadcast::channel(BET_RESULT_CAPACITY);

    (
        EventTransport {
            events_tx,
            bet_results_tx: bet_results_tx.clone(),
        },
        HostEndpoint {
            events_rx,
            bet_results_tx,
        },
    )
}

impl EventTransport {
    fn dispatch(&self, op: Operation, data: Option<Value>) -> Result<oneshot::Receiver<Reply>> {
        let json = data.as_ref().map(Value::to_string).unwrap_or_default();
        debug!("[Game→Host] {} json={}", op, preview(&json));

        let (reply_tx, reply_rx) = oneshot::channel();
        self.events_tx
            .send(HostEvent {
                op,
                data,
                reply: Responder(reply_tx),
            })
            .map_err(|_| BridgeError::Ipc("Host endpoint closed".into()))?;
        Ok(reply_rx)
    }
}

#[async_trait]
impl HostTransport for EventTransport {
    async fn send(&self, op: Operation, payload: Option<Value>) -> Result<Value> {
        let reply_rx = self.dispatch(op, payload)?;

        match reply_rx.await {
            Ok(Ok(value)) => {
                debug!("[Host→Game] {} resolved", op);
                Ok(value)
            }
            Ok(Err(reason)) => {
                debug!("[Host→Game] {} rejected: {}", op, reason);
                Err(BridgeError::Rejected(reason))
            }
            Err(_) => {
                warn!("Host dropped {} without replying", op);
                Err(BridgeError::HostGone)
            }
        }
    }

    fn notify(&self, op: Operation, payload: Option<Value>) -> Result<()> {
        self.dispatch(op, payload).map(drop)
    }

    fn subscribe_bet_results(&self) -> Option<broadcast::Receiver<BetResult>> {
        Some(self.bet_results_tx.subscribe())
    }
}

impl HostEndpoint {
    /// Next event sent by the game; None once every transport is dropped
    pub async fn recv(&mut self) -> Option<HostEvent> {
        self.events_rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<HostEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Push a `betResult` notification to every subscribed listener.
    /// Returns the number of listeners that received it.
    pub fn push_bet_result(&self, result: BetResult) -> usize {
        debug!("[Host→Game] betResult d={}", result.game_id);
        // No listeners registered yet is not an error
        self.bet_results_tx.send(result).unwrap_or(0)
    }

    /// Sender for pushing `betResult` from another task
    pub fn bet_result_sender(&self) -> broadcast::Sender<BetResult> {
        self.bet_results_tx.clone()
    }
}
