//! Host side operation handling

use async_trait::async_trait;
use game_manager_bridge::HostEndpoint;
use game_manager_core::Operation;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a host operation: `Ok` resolves, `Err` rejects with a reason
pub type Reply = Result<Value, Value>;

/// Trait for implementing a host application
///
/// Implement this trait to answer the operations a game sends.
#[async_trait]
pub trait HostHandler: Send + Sync + 'static {
    /// Handle one operation. `data` is null when the game sent no payload.
    async fn handle(&self, op: Operation, data: Value) -> Reply;
}

#[async_trait]
impl<H: HostHandler> HostHandler for Arc<H> {
    async fn handle(&self, op: Operation, data: Value) -> Reply {
        (**self).handle(op, data).await
    }
}

/// Decode an operation payload.
///
/// Games may send a structured value or the same value as a JSON string.
pub fn decode_payload<D: DeserializeOwned>(op: Operation, data: Value) -> Result<D, Value> {
    let decoded = match data {
        Value::String(s) => serde_json::from_str(&s),
        other => serde_json::from_value(other),
    };
    decoded.map_err(|e| Value::String(format!("Invalid {} payload: {}", op, e)))
}

/// Answer events from an in-process game until every transport is dropped
pub async fn serve_events<H: HostHandler>(mut endpoint: HostEndpoint, handler: H) {
    info!("Serving game events");

    while let Some(event) = endpoint.recv().await {
        let op = event.op;
        let awaited = event.reply.is_awaited();
        match handler.handle(op, event.data.unwrap_or(Value::Null)).await {
            Ok(value) => {
                debug!("{} resolved", op);
                event.reply.resolve(value);
            }
            Err(reason) if awaited => {
                debug!("{} rejected: {}", op, reason);
                event.reply.reject(reason);
            }
            Err(reason) => warn!("Fire-and-forget {} failed: {}", op, reason),
        }
    }

    info!("Game disconnected");
}
