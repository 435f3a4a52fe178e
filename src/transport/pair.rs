//! In-memory duplex channel.
//!
//! Two [`PairChannel`] halves connected back-to-back; what one sends the
//! other receives, in order. Used by tests and demos to drive a kernel and a
//! front-end inside one process.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::Channel;
use crate::error::{KernelError, Result};

/// Create a connected pair of channels.
pub fn pair() -> (PairChannel, PairChannel) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (
        PairChannel { tx: a_tx, rx: a_rx },
        PairChannel { tx: b_tx, rx: b_rx },
    )
}

/// One half of an in-memory duplex channel.
#[derive(Debug)]
pub struct PairChannel {
    tx: mpsc::UnboundedSender<Vec<Bytes>>,
    rx: mpsc::UnboundedReceiver<Vec<Bytes>>,
}

#[async_trait]
impl Channel for PairChannel {
    async fn send(&mut self, frames: Vec<Bytes>) -> Result<()> {
        self.tx
            .send(frames)
            .map_err(|_| KernelError::ChannelClosed)
    }

    async fn recv(&mut self) -> Result<Vec<Bytes>> {
        self.rx.recv().await.ok_or(KernelError::ChannelClosed)
    }

    async fn try_recv(&mut self) -> Result<Option<Vec<Bytes>>> {
        match self.rx.try_recv() {
            Ok(frames) => Ok(Some(frames)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(KernelError::ChannelClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_recv_preserves_frames() {
        let (mut a, mut b) = pair();
        let frames = vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")];
        a.send(frames.clone()).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), frames);
    }

    #[tokio::test]
    async fn test_try_recv_empty_is_none() {
        let (mut a, _b) = pair();
        assert!(a.try_recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_units_arrive_in_order() {
        let (mut a, mut b) = pair();
        for i in 0..5u8 {
            a.send(vec![Bytes::copy_from_slice(&[i])]).await.unwrap();
        }
        for i in 0..5u8 {
            let unit = b.recv().await.unwrap();
            assert_eq!(unit[0][0], i);
        }
    }

    #[tokio::test]
    async fn test_closed_peer_reported() {
        let (mut a, b) = pair();
        drop(b);
        assert!(matches!(
            a.send(vec![]).await,
            Err(KernelError::ChannelClosed)
        ));
        assert!(matches!(a.recv().await, Err(KernelError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_try_recv_drains_then_reports_closed() {
        let (mut a, mut b) = pair();
        b.send(vec![Bytes::from_static(b"last")]).await.unwrap();
        drop(b);
        // Queued unit is still delivered before the closure is visible.
        assert!(a.try_recv().await.unwrap().is_some());
        assert!(matches!(
            a.try_recv().await,
            Err(KernelError::ChannelClosed)
        ));
    }
}
