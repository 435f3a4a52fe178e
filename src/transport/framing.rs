//! Stream framing for multipart units.
//!
//! Channels backed by a byte stream carry each frame as a 5-byte header
//! followed by the frame payload:
//!
//! ```text
//! ┌───────┬──────────┬─────────┐
//! │ Flags │ Length   │ Payload │
//! │ 1 byte│ 4 bytes  │ N bytes │
//! │       │ uint32 BE│         │
//! └───────┴──────────┴─────────┘
//! ```
//!
//! Bit 0 of the flags byte (`FLAG_MORE`) marks that another frame of the
//! same multipart unit follows; the first frame without it closes the unit.
//!
//! [`MultipartBuffer`] accumulates partial reads and yields complete units,
//! using a state machine over a single `BytesMut` to minimize allocations.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KernelError, Result};

/// Frame header size in bytes (flags + length).
pub const FRAME_HEADER_SIZE: usize = 5;

/// More-frames-follow flag.
pub const FLAG_MORE: u8 = 0b0000_0001;

/// Maximum allowed single-frame payload (64 MB).
pub const MAX_FRAME_SIZE: u32 = 64 * 1024 * 1024;

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for a complete 5-byte frame header.
    WaitingForHeader,
    /// Header parsed, waiting for the frame payload.
    WaitingForPayload { more: bool, remaining: u32 },
}

/// Buffer accumulating incoming bytes and extracting complete multipart units.
#[derive(Debug)]
pub struct MultipartBuffer {
    /// Accumulated bytes from stream reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Frames of the unit currently being assembled.
    partial: Vec<Bytes>,
    /// Maximum allowed frame payload size.
    max_frame_size: u32,
    /// Discarding the remainder of a unit that contained an oversized frame.
    discarding: bool,
}

impl MultipartBuffer {
    /// Create a buffer with default limits.
    pub fn new() -> Self {
        Self::with_max_frame(MAX_FRAME_SIZE)
    }

    /// Create a buffer with a custom frame size limit.
    pub fn with_max_frame(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForHeader,
            partial: Vec::new(),
            max_frame_size,
            discarding: false,
        }
    }

    /// Push data into the buffer and extract all complete multipart units.
    ///
    /// Fragmented frames are buffered internally for the next push.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Protocol`] once if a frame exceeds the size
    /// limit. The whole unit containing the oversized frame is discarded as
    /// its bytes arrive; later units parse normally.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Vec<Bytes>>> {
        self.buffer.extend_from_slice(data);

        let mut units = Vec::new();
        while let Some(unit) = self.try_extract_unit()? {
            units.push(unit);
        }
        Ok(units)
    }

    /// Whether no partially-parsed frame or unit is buffered.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty()
            && self.partial.is_empty()
            && !self.discarding
            && matches!(self.state, State::WaitingForHeader)
    }

    fn try_extract_unit(&mut self) -> Result<Option<Vec<Bytes>>> {
        loop {
            match &self.state {
                State::WaitingForHeader => {
                    if self.buffer.len() < FRAME_HEADER_SIZE {
                        return Ok(None);
                    }

                    let flags = self.buffer[0];
                    let length = u32::from_be_bytes([
                        self.buffer[1],
                        self.buffer[2],
                        self.buffer[3],
                        self.buffer[4],
                    ]);
                    let _ = self.buffer.split_to(FRAME_HEADER_SIZE);
                    let more = flags & FLAG_MORE != 0;
                    self.state = State::WaitingForPayload {
                        more,
                        remaining: length,
                    };

                    if length > self.max_frame_size && !self.discarding {
                        // Poison the unit: its frames assembled so far and
                        // everything up to the closing frame get dropped as
                        // the bytes arrive, then parsing resumes.
                        self.partial.clear();
                        self.discarding = true;
                        return Err(KernelError::Protocol(format!(
                            "frame size {} exceeds maximum {}",
                            length, self.max_frame_size
                        )));
                    }
                }

                State::WaitingForPayload { more, remaining } => {
                    let more = *more;
                    let remaining = *remaining as usize;

                    if self.discarding {
                        let take = remaining.min(self.buffer.len());
                        let _ = self.buffer.split_to(take);
                        if take < remaining {
                            self.state = State::WaitingForPayload {
                                more,
                                remaining: (remaining - take) as u32,
                            };
                            return Ok(None);
                        }
                        self.state = State::WaitingForHeader;
                        if !more {
                            self.discarding = false;
                        }
                        continue;
                    }

                    if self.buffer.len() < remaining {
                        return Ok(None);
                    }

                    // Zero-copy freeze of the payload bytes.
                    let payload = self.buffer.split_to(remaining).freeze();
                    self.partial.push(payload);
                    self.state = State::WaitingForHeader;

                    if !more {
                        return Ok(Some(std::mem::take(&mut self.partial)));
                    }
                }
            }
        }
    }
}

impl Default for MultipartBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a multipart unit into a contiguous byte buffer.
///
/// All frames of the unit are laid out back-to-back so a single write keeps
/// the unit atomic on the stream. An empty unit encodes as one empty frame.
///
/// # Errors
///
/// Returns [`KernelError::Protocol`] if any frame exceeds [`MAX_FRAME_SIZE`];
/// a peer would refuse it, and its length would not fit the header field.
pub fn encode_unit(frames: &[Bytes]) -> Result<Vec<u8>> {
    if let Some(frame) = frames.iter().find(|f| f.len() > MAX_FRAME_SIZE as usize) {
        return Err(KernelError::Protocol(format!(
            "frame size {} exceeds maximum {}",
            frame.len(),
            MAX_FRAME_SIZE
        )));
    }

    let total: usize = frames
        .iter()
        .map(|f| FRAME_HEADER_SIZE + f.len())
        .sum::<usize>()
        .max(FRAME_HEADER_SIZE);
    let mut buf = Vec::with_capacity(total);

    if frames.is_empty() {
        buf.put_u8(0);
        buf.put_u32(0);
        return Ok(buf);
    }

    for (i, frame) in frames.iter().enumerate() {
        let more = i + 1 < frames.len();
        buf.put_u8(if more { FLAG_MORE } else { 0 });
        buf.put_u32(frame.len() as u32);
        buf.extend_from_slice(frame);
    }
    Ok(buf)
}
