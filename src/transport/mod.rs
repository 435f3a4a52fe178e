//! Transport module - channel abstraction and concrete channels.
//!
//! The kernel core is written against the [`Channel`] trait: an endpoint
//! that moves whole multipart units (ordered frame sequences) in each
//! direction. Routing identity lives inside the frames themselves, so the
//! same trait serves the routed request channel, the broadcast channel, and
//! the heartbeat channel.

mod framing;
mod pair;
mod tcp;

pub use framing::{encode_unit, MultipartBuffer, FLAG_MORE, FRAME_HEADER_SIZE, MAX_FRAME_SIZE};
pub use pair::{pair, PairChannel};
pub use tcp::TcpChannel;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A bidirectional endpoint carrying multipart units.
///
/// `send` transmits all frames of one unit back-to-back with no interleaving
/// from another logical message on the same channel.
#[async_trait]
pub trait Channel: Send {
    /// Send one multipart unit atomically.
    async fn send(&mut self, frames: Vec<Bytes>) -> Result<()>;

    /// Receive one multipart unit, waiting until one is available.
    async fn recv(&mut self) -> Result<Vec<Bytes>>;

    /// Receive one multipart unit if immediately available.
    ///
    /// Returns `Ok(None)` when no unit is queued; absence is not an error.
    async fn try_recv(&mut self) -> Result<Option<Vec<Bytes>>>;
}

/// The three channel handles a kernel runs on.
#[derive(Debug)]
pub struct ChannelSet<S, P, H> {
    /// Routed request/reply channel.
    pub shell: S,
    /// Broadcast/publish channel.
    pub iopub: P,
    /// Heartbeat echo channel.
    pub heartbeat: H,
}
