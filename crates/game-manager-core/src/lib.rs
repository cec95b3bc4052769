//! # game-manager-core
//!
//! Core types for the casino game manager bridge.
//!
//! This crate provides the data contracts exchanged between a mini-game and
//! its hosting parent application:
//! - Bet requests, results and history records
//! - Bet configuration and balance information
//! - Operation names understood by the host
//! - Error types
//! - Timestamp normalization helpers

pub mod balance;
pub mod bet;
pub mod config;
pub mod error;
pub mod history;
pub mod operation;
pub mod time;

pub use balance::{BalanceInfo, DEFAULT_ASSET};
pub use bet::{BetItem, BetRequest, BetResult, FavoriteBets, PlaceBetAck};
pub use config::{BetConfig, BetLimits};
pub use error::{BridgeError, Result};
pub use history::{BetHistory, BetHistoryItem, BetHistoryRequest};
pub use operation::{BET_RESULT_EVENT, Operation};
pub use time::{date_value_in_seconds, normalize_date, parse_date_value};

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value = <Option<T> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
