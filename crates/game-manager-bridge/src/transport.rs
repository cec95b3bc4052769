//! The transport seam between a game manager and its host

use async_trait::async_trait;
use game_manager_core::{BetResult, Operation, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Delivers named operations to the host application.
///
/// Implementations are pure transports: they never time out, retry or
/// inspect payloads. A host that never answers leaves `send` pending forever.
#[async_trait]
pub trait HostTransport: Send + Sync {
    /// Deliver an operation and wait for the host to resolve or reject it.
    ///
    /// A rejection is returned as `BridgeError::Rejected` carrying the host's
    /// reason unchanged.
    async fn send(&self, op: Operation, payload: Option<Value>) -> Result<Value>;

    /// Deliver an operation without waiting for a reply.
    ///
    /// Success only means the notification was handed to the transport;
    /// there is no delivery guarantee.
    fn notify(&self, op: Operation, payload: Option<Value>) -> Result<()>;

    /// Subscribe to `betResult` notifications pushed by the host.
    /// Returns None if the transport has no push channel.
    fn subscribe_bet_results(&self) -> Option<broadcast::Receiver<BetResult>> {
        None
    }
}

#[async_trait]
impl<T: HostTransport + ?Sized> HostTransport for Arc<T> {
    async fn send(&self, op: Operation, payload: Option<Value>) -> Result<Value> {
        (**self).send(op, payload).await
    }

    fn notify(&self, op: Operation, payload: Option<Value>) -> Result<()> {
        (**self).notify(op, payload)
    }

    fn subscribe_bet_results(&self) -> Option<broadcast::Receiver<BetResult>> {
        (**self).subscribe_bet_results()
    }
}
