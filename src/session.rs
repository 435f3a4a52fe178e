//! Process-wide protocol identity.
//!
//! A [`Session`] owns the session id, user name, and shared secret, mints
//! headers with fresh message ids, and moves whole messages over channels
//! through the wire codec. It is created once at startup and lives for the
//! process lifetime.

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::protocol::{Header, Message, MessageKind, Parent, WireCodec, WireMessage,
    PROTOCOL_VERSION};
use crate::transport::Channel;

/// Session identity and message factory.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    username: String,
    codec: WireCodec,
}

impl Session {
    /// Create a session with a fresh session id.
    ///
    /// An empty `key` disables message signing.
    pub fn new(username: &str, key: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            codec: WireCodec::new(crate::auth::MessageSigner::new(key)),
        }
    }

    /// Stable session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The wire codec bound to this session's signer.
    pub fn codec(&self) -> &WireCodec {
        &self.codec
    }

    /// Mint a header with a fresh message id and the current time.
    ///
    /// Message ids are v4 UUIDs, so minting is collision-free and safe to
    /// call from any task concurrently.
    pub fn new_header(&self, kind: MessageKind) -> Header {
        Header {
            msg_id: Uuid::new_v4().to_string(),
            session: self.id.clone(),
            username: self.username.clone(),
            version: PROTOCOL_VERSION.to_string(),
            date: Some(Utc::now()),
            msg_type: kind.as_str().to_string(),
        }
    }

    /// Compose a message: fresh header, parent header extracted from
    /// `parent`, serialized content, no buffers.
    pub fn message<'a, T, P>(&self, kind: MessageKind, content: &T, parent: P) -> Result<Message>
    where
        T: serde::Serialize,
        P: Into<Parent<'a>>,
    {
        Ok(Message {
            header: self.new_header(kind),
            parent_header: parent.into().extract(),
            metadata: serde_json::Map::new(),
            content: serde_json::to_value(content)?,
            buffers: Vec::new(),
        })
    }

    /// Encode and send one message as a single atomic multipart unit.
    pub async fn send<C: Channel>(
        &self,
        channel: &mut C,
        message: &Message,
        identities: &[Bytes],
    ) -> Result<()> {
        let frames = self.codec.encode(message, identities)?;
        channel.send(frames).await
    }

    /// Receive and decode one message, waiting until one arrives.
    pub async fn recv<C: Channel>(&self, channel: &mut C) -> Result<WireMessage> {
        let frames = channel.recv().await?;
        self.codec.decode(frames)
    }

    /// Receive and decode one message if immediately available.
    ///
    /// Returns `Ok(None)` when the channel has nothing queued; a queued but
    /// undecodable unit is an error, not absence.
    pub async fn try_recv<C: Channel>(&self, channel: &mut C) -> Result<Option<WireMessage>> {
        match channel.try_recv().await? {
            Some(frames) => self.codec.decode(frames).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for Session {
    /// Unsigned session under the default kernel user name.
    fn default() -> Self {
        Self::new("kernel", "")
    }
}
