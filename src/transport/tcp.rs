//! TCP-backed channel.
//!
//! Binds one protocol endpoint to a host:port and carries multipart units
//! over the stream framing from [`super::framing`]. The kernel side binds
//! and accepts a single front-end connection per endpoint; a front-end
//! connects.
//!
//! # Example
//!
//! ```ignore
//! use replwire::transport::TcpChannel;
//!
//! let mut shell = TcpChannel::bind("127.0.0.1:5555").await?;
//! let unit = shell.recv().await?;
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::framing::{encode_unit, MultipartBuffer};
use super::Channel;
use crate::error::{KernelError, Result};

/// A connected stream endpoint carrying multipart units.
#[derive(Debug)]
pub struct TcpChannel {
    stream: TcpStream,
    buffer: MultipartBuffer,
    /// Units decoded but not yet handed to the caller.
    pending: VecDeque<Vec<Bytes>>,
    read_buf: Vec<u8>,
}

impl TcpChannel {
    /// Bind the given address and accept one peer connection.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (stream, _peer) = listener.accept().await?;
        Ok(Self::from_stream(stream))
    }

    /// Connect to a listening endpoint.
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already-connected stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: MultipartBuffer::new(),
            pending: VecDeque::new(),
            read_buf: vec![0u8; 64 * 1024],
        }
    }

    fn absorb(&mut self, n: usize) -> Result<()> {
        let units = {
            let data = &self.read_buf[..n];
            self.buffer.push(data)?
        };
        self.pending.extend(units);
        Ok(())
    }
}

#[async_trait]
impl Channel for TcpChannel {
    async fn send(&mut self, frames: Vec<Bytes>) -> Result<()> {
        // One contiguous write keeps the unit atomic on the stream.
        let bytes = encode_unit(&frames)?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<Bytes>> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Ok(unit);
            }
            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(KernelError::ChannelClosed);
            }
            self.absorb(n)?;
        }
    }

    async fn try_recv(&mut self) -> Result<Option<Vec<Bytes>>> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Ok(Some(unit));
            }
            match self.stream.try_read(&mut self.read_buf) {
                Ok(0) => return Err(KernelError::ChannelClosed),
                Ok(n) => self.absorb(n)?,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(KernelError::Io(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected_pair() -> (TcpChannel, TcpChannel) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (accepted, _peer) = listener.accept().await.unwrap();
        let connected = connect.await.unwrap();
        (
            TcpChannel::from_stream(accepted),
            TcpChannel::from_stream(connected),
        )
    }

    fn unit(parts: &[&[u8]]) -> Vec<Bytes> {
        parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
    }

    #[tokio::test]
    async fn test_send_recv_roundtrip() {
        let (mut a, mut b) = connected_pair().await;
        let frames = unit(&[b"ident", b"<IDS|MSG>", b"", b"{}", b"{}", b"{}", b"{}"]);
        a.send(frames.clone()).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), frames);
    }

    #[tokio::test]
    async fn test_back_to_back_units_stay_separate() {
        let (mut a, mut b) = connected_pair().await;
        let first = unit(&[b"one"]);
        let second = unit(&[b"two", b"three"]);
        a.send(first.clone()).await.unwrap();
        a.send(second.clone()).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), first);
        assert_eq!(b.recv().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_try_recv_without_data() {
        let (mut a, _b) = connected_pair().await;
        assert!(a.try_recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_try_recv_after_send() {
        let (mut a, mut b) = connected_pair().await;
        b.send(unit(&[b"ping"])).await.unwrap();
        // Give the kernel socket buffer a moment.
        let mut got = None;
        for _ in 0..50 {
            if let Some(unit) = a.try_recv().await.unwrap() {
                got = Some(unit);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(got.unwrap(), unit(&[b"ping"]));
    }

    #[tokio::test]
    async fn test_peer_close_reported() {
        let (mut a, b) = connected_pair().await;
        drop(b);
        assert!(matches!(a.recv().await, Err(KernelError::ChannelClosed)));
    }
}
