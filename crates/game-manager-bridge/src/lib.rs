//! Message bridge between a mini-game and its host application
//!
//! This crate provides:
//! - `HostTransport`, the seam every game manager talks through
//! - An in-process event channel transport (`{ data, resolve, reject }` envelopes)
//! - A length-prefixed JSON stream transport over TCP or Unix sockets
//! - Framing helpers shared with host implementations

pub mod channel;
pub mod frame;
pub mod protocol;
pub mod stream;
pub mod tcp;
pub mod transport;
#[cfg(unix)]
pub mod unix;

pub use channel::{EventTransport, HostEndpoint, HostEvent, Responder, event_channel};
pub use frame::{AsyncReader, AsyncWriter, FrameReader, FrameWriter, MAX_FRAME_LEN};
pub use protocol::{HostFrame, deserialize, serialize};
pub use stream::{StreamConfig, StreamTransport};
pub use transport::HostTransport;

/// First 200 characters of a JSON payload, for logging
pub(crate) fn preview(json: &str) -> String {
    json.chars().take(200).collect()
}
