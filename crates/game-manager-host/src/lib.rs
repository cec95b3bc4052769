//! Reference host application for casino mini-games
//!
//! This crate provides:
//! - `HostHandler`, the trait a parent application implements per operation
//! - `MemoryHost`, an in-memory parent app for local development and tests
//! - Serve loops for the event channel and stream transports

pub mod handler;
pub mod memory;
pub mod server;

pub use handler::{HostHandler, Reply, decode_payload, serve_events};
pub use memory::{HostConfig, MemoryHost};
pub use server::{HostEvents, serve_stream, serve_tcp};
