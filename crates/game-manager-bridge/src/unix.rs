//! Unix domain socket connection setup for the stream transport

use crate::frame::{FrameReader, FrameWriter};
use game_manager_core::{BridgeError, Result};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

/// Unix socket frame reader
pub type UnixReadWrapper = FrameReader<OwnedReadHalf>;

/// Unix socket frame writer
pub type UnixWriteWrapper = FrameWriter<OwnedWriteHalf>;

/// Wrap an accepted or connected stream into frame halves
pub fn split(stream: UnixStream) -> (UnixReadWrapper, UnixWriteWrapper) {
    let (read_half, write_half) = stream.into_split();
    (FrameReader(read_half), FrameWriter(write_half))
}

/// Connect to a host listening on a socket path
pub async fn connect(path: &str) -> Result<(UnixReadWrapper, UnixWriteWrapper)> {
    let stream = UnixStream::connect(path)
        .await
        .map_err(|e| BridgeError::Ipc(format!("Failed to connect to {}: {}", path, e)))?;
    Ok(split(stream))
}
