//! TCP connection setup for the stream transport

use crate::frame::{FrameReader, FrameWriter};
use crate::stream::StreamConfig;
use game_manager_core::{BridgeError, Result};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// TCP frame reader
pub type TcpReadWrapper = FrameReader<OwnedReadHalf>;

/// TCP frame writer
pub type TcpWriteWrapper = FrameWriter<OwnedWriteHalf>;

/// Wrap an accepted or connected stream into frame halves
pub fn split(stream: TcpStream) -> Result<(TcpReadWrapper, TcpWriteWrapper)> {
    // Disable Nagle's algorithm, frames are small and latency sensitive
    stream
        .set_nodelay(true)
        .map_err(|e| BridgeError::Ipc(format!("Failed to set TCP_NODELAY: {}", e)))?;

    let (read_half, write_half) = stream.into_split();
    Ok((FrameReader(read_half), FrameWriter(write_half)))
}

/// Connect to a host, bounded by the configured connect timeout
pub async fn connect(config: &StreamConfig) -> Result<(TcpReadWrapper, TcpWriteWrapper)> {
    let addr = config.addr();

    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| BridgeError::Ipc(format!("Connection timeout to {}", addr)))?
        .map_err(|e| BridgeError::Ipc(format!("Failed to connect to {}: {}", addr, e)))?;

    split(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{AsyncReader, AsyncWriter};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_and_exchange_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut reader, _writer) = split(stream).unwrap();
            reader.read_message().await.unwrap()
        });

        let config = StreamConfig {
            port,
            ..Default::default()
        };
        let (_reader, mut writer) = connect(&config).await.unwrap();
        writer.write_message(b"{\"ok\":true}").await.unwrap();

        assert_eq!(server.await.unwrap(), b"{\"ok\":true}".to_vec());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = StreamConfig {
            port,
            ..Default::default()
        };

        assert!(matches!(connect(&config).await, Err(BridgeError::Ipc(_))));
    }
}
