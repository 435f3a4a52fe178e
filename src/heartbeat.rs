//! Heartbeat echo service.
//!
//! Liveness probing for front-ends: every received unit is echoed back
//! unmodified, unconditionally. Runs on its own task and is never blocked by
//! the dispatch loop; the two share no mutable state.

use crate::error::{KernelError, Result};
use crate::transport::Channel;

/// Echo every received unit until the peer closes the channel.
pub async fn run<C: Channel>(mut channel: C) -> Result<()> {
    loop {
        let frames = match channel.recv().await {
            Ok(frames) => frames,
            Err(KernelError::ChannelClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        channel.send(frames).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::pair;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_echoes_frames_verbatim() {
        let (kernel_side, mut probe) = pair();
        let task = tokio::spawn(run(kernel_side));

        for payload in [&b"ping"[..], b"", b"\x00\x01"] {
            let unit = vec![Bytes::copy_from_slice(payload)];
            probe.send(unit.clone()).await.unwrap();
            assert_eq!(probe.recv().await.unwrap(), unit);
        }

        drop(probe);
        task.await.expect("heartbeat task panicked").unwrap();
    }

    #[tokio::test]
    async fn test_echoes_multiframe_units() {
        let (kernel_side, mut probe) = pair();
        let task = tokio::spawn(run(kernel_side));

        let unit = vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")];
        probe.send(unit.clone()).await.unwrap();
        assert_eq!(probe.recv().await.unwrap(), unit);

        drop(probe);
        task.await.expect("heartbeat task panicked").unwrap();
    }
}
