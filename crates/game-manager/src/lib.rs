//! # game-manager
//!
//! Typed façade a mini-game uses to talk to its hosting parent application.
//!
//! This crate provides:
//! - `GameManager`, one async method per host operation
//! - An in-memory history cache, replaced wholesale on refresh
//! - `BetResultProcessor`, the per-game hook that interprets bet outcomes
//! - `BetResultListener`, routing pushed `betResult` notifications through the hook

pub mod listener;
pub mod manager;
pub mod processor;

pub use listener::BetResultListener;
pub use manager::GameManager;
pub use processor::{BetResultProcessor, FnProcessor};

pub use game_manager_bridge::HostTransport;
pub use game_manager_core::*;
