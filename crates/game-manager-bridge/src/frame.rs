//! Length-prefixed framing for stream transports
//!
//! Messages are a 4-byte little-endian length followed by a JSON body.

use async_trait::async_trait;
use game_manager_core::{BridgeError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted frame body (64MB)
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Trait for async reading from a transport
#[async_trait]
pub trait AsyncReader: Send {
    /// Read one complete frame body
    async fn read_message(&mut self) -> Result<Vec<u8>>;
}

/// Trait for async writing to a transport
#[async_trait]
pub trait AsyncWriter: Send + Sync {
    /// Write one complete frame body
    async fn write_message(&mut self, data: &[u8]) -> Result<()>;
}

/// Frame reader over any byte stream
pub struct FrameReader<R>(pub R);

/// Frame writer over any byte stream
pub struct FrameWriter<W>(pub W);

#[async_trait]
impl<R: AsyncRead + Unpin + Send> AsyncReader for FrameReader<R> {
    async fn read_message(&mut self) -> Result<Vec<u8>> {
        let mut len_bytes = [0u8; 4];
        self.0
            .read_exact(&mut len_bytes)
            .await
            .map_err(|e| BridgeError::Ipc(format!("Read length failed: {}", e)))?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > MAX_FRAME_LEN {
            return Err(BridgeError::Ipc(format!("Message too large: {} bytes", len)));
        }

        let mut data = vec![0u8; len];
        self.0
            .read_exact(&mut data)
            .await
            .map_err(|e| BridgeError::Ipc(format!("Read data failed: {}", e)))?;

        Ok(data)
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + Sync> AsyncWriter for FrameWriter<W> {
    async fn write_message(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FRAME_LEN {
            return Err(BridgeError::Ipc(format!(
                "Message too large: {} bytes",
                data.len()
            )));
        }

        let len = (data.len() as u32).to_le_bytes();
        self.0
            .write_all(&len)
            .await
            .map_err(|e| BridgeError::Ipc(format!("Write length failed: {}", e)))?;
        self.0
            .write_all(data)
            .await
            .map_err(|e| BridgeError::Ipc(format!("Write data failed: {}", e)))?;
        self.0
            .flush()
            .await
            .map_err(|e| BridgeError::Ipc(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}
