//! Multipart wire codec.
//!
//! A logical message travels as an ordered frame sequence:
//!
//! ```text
//! [identity...] <IDS|MSG> signature header parent_header metadata content [buffer...]
//! ```
//!
//! Everything before the delimiter frame is opaque routing identity, echoed
//! back verbatim on reply. The signature covers exactly the four JSON parts
//! that follow it; buffers ride along unsigned and unparsed. Separating
//! identity, signature, and content lets a receiver authenticate and parse
//! the message without understanding transport routing, and lets a sender
//! re-emit the same logical message to a different route.

use bytes::Bytes;

use crate::auth::MessageSigner;
use crate::codec::JsonCodec;
use crate::error::{KernelError, Result};
use crate::protocol::message::Message;

/// Sentinel frame separating routing identities from the payload frames.
pub const DELIM: &[u8] = b"<IDS|MSG>";

/// Number of signed payload frames (header, parent header, metadata, content).
const SIGNED_PARTS: usize = 4;

/// A decoded message together with the routing identities it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    /// Transport-assigned return address, opaque and order-preserving.
    pub identities: Vec<Bytes>,
    /// The logical message.
    pub message: Message,
}

/// Packs and unpacks messages to/from frame sequences.
#[derive(Debug, Clone)]
pub struct WireCodec {
    signer: MessageSigner,
}

impl WireCodec {
    /// Create a codec with the given signer.
    pub fn new(signer: MessageSigner) -> Self {
        Self { signer }
    }

    /// Create a codec with signing disabled.
    pub fn unsigned() -> Self {
        Self {
            signer: MessageSigner::disabled(),
        }
    }

    /// The signer in use.
    pub fn signer(&self) -> &MessageSigner {
        &self.signer
    }

    /// Encode a message into its frame sequence.
    ///
    /// Frame order: identities, delimiter, signature, header, parent header,
    /// metadata, content, buffers.
    pub fn encode(&self, message: &Message, identities: &[Bytes]) -> Result<Vec<Bytes>> {
        let header = JsonCodec::encode(&message.header)?;
        let parent = JsonCodec::encode(&message.parent_header)?;
        let metadata = JsonCodec::encode(&message.metadata)?;
        let content = JsonCodec::encode(&message.content)?;

        let signature = self.signer.sign(&[
            header.as_ref(),
            parent.as_ref(),
            metadata.as_ref(),
            content.as_ref(),
        ]);

        let mut frames =
            Vec::with_capacity(identities.len() + 2 + SIGNED_PARTS + message.buffers.len());
        frames.extend(identities.iter().cloned());
        frames.push(Bytes::from_static(DELIM));
        frames.push(Bytes::from(signature));
        frames.push(header);
        frames.push(parent);
        frames.push(metadata);
        frames.push(content);
        frames.extend(message.buffers.iter().cloned());
        Ok(frames)
    }

    /// Decode a frame sequence into a message plus routing identities.
    ///
    /// # Errors
    ///
    /// - [`KernelError::MalformedMessage`] when the delimiter is missing or
    ///   fewer than four payload frames follow the signature.
    /// - [`KernelError::SignatureMismatch`] when a key is configured and the
    ///   signature does not verify.
    pub fn decode(&self, frames: Vec<Bytes>) -> Result<WireMessage> {
        let delim_at = frames
            .iter()
            .position(|frame| frame.as_ref() == DELIM)
            .ok_or_else(|| {
                KernelError::MalformedMessage("missing delimiter frame".to_string())
            })?;

        let identities = frames[..delim_at].to_vec();
        let payload = &frames[delim_at + 1..];
        // Signature frame plus the four signed parts.
        if payload.len() < 1 + SIGNED_PARTS {
            return Err(KernelError::MalformedMessage(format!(
                "expected at least {} frames after delimiter, got {}",
                1 + SIGNED_PARTS,
                payload.len()
            )));
        }

        let signature = &payload[0];
        let (header, parent, metadata, content) =
            (&payload[1], &payload[2], &payload[3], &payload[4]);
        self.signer.verify(
            &[
                header.as_ref(),
                parent.as_ref(),
                metadata.as_ref(),
                content.as_ref(),
            ],
            signature.as_ref(),
        )?;

        let message = Message {
            header: JsonCodec::decode(header)?,
            parent_header: JsonCodec::decode(parent)?,
            metadata: JsonCodec::decode(metadata)?,
            content: JsonCodec::decode(content)?,
            buffers: payload[1 + SIGNED_PARTS..].to_vec(),
        };

        Ok(WireMessage {
            identities,
            message,
        })
    }
}
