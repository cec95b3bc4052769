//! Wire protocol for stream transports
//!
//! Frames are JSON with an internally-tagged `Type` field, PascalCase throughout.
//! A `Request` without an `Id` is fire-and-forget and is never answered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames exchanged between a game and its host
///
/// Note: `rename_all` on enums only affects variant names, not field names inside variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum HostFrame {
    // === Game -> Host ===
    /// Operation request
    Request {
        #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        #[serde(rename = "Method")]
        method: String,
        #[serde(rename = "Data", default)]
        data: Value,
    },

    // === Host -> Game ===
    /// Request fulfilled
    Resolve {
        #[serde(rename = "Id")]
        id: u64,
        #[serde(rename = "Value", default)]
        value: Value,
    },

    /// Request rejected
    Reject {
        #[serde(rename = "Id")]
        id: u64,
        #[serde(rename = "Reason", default)]
        reason: Value,
    },

    /// Unsolicited notification, e.g. `betResult`
    Event {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Detail", default)]
        detail: Value,
    },
}

/// Serialize a frame to JSON bytes
pub fn serialize(frame: &HostFrame) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(frame)
}

/// Deserialize a frame from JSON bytes
pub fn deserialize(bytes: &[u8]) -> Result<HostFrame, serde_json::Error> {
    serde_json::from_slice(bytes)
}
