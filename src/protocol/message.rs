//! Logical message model.
//!
//! A [`Message`] is the unit of communication: a header identifying the
//! message itself, the header of the message that caused it (empty for
//! unsolicited messages such as heartbeats), a reserved metadata map, a
//! kind-dependent content object, and zero or more opaque binary buffers.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Protocol version stamped into every minted header.
pub const PROTOCOL_VERSION: &str = "0.14.0";

/// Message kinds with registered content schemas.
///
/// Dispatch is keyed by this enum; a kind string that does not parse is
/// dropped by the dispatch loop without a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Request: evaluate source text.
    ExecuteRequest,
    /// Reply to an execute request.
    ExecuteReply,
    /// Request: complete the given input.
    CompleteRequest,
    /// Reply to a completion request.
    CompleteReply,
    /// Broadcast: echo of the input about to be evaluated.
    InputEcho,
    /// Broadcast: rendered result of a successful evaluation.
    ExecuteResult,
    /// Broadcast: diagnostic for a failed evaluation.
    Error,
}

impl MessageKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecuteRequest => "execute_request",
            Self::ExecuteReply => "execute_reply",
            Self::CompleteRequest => "complete_request",
            Self::CompleteReply => "complete_reply",
            Self::InputEcho => "input_echo",
            Self::ExecuteResult => "execute_result",
            Self::Error => "error",
        }
    }

    /// Parse a wire name. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "execute_request" => Some(Self::ExecuteRequest),
            "execute_reply" => Some(Self::ExecuteReply),
            "complete_request" => Some(Self::CompleteRequest),
            "complete_reply" => Some(Self::CompleteReply),
            "input_echo" => Some(Self::InputEcho),
            "execute_result" => Some(Self::ExecuteResult),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// The reply kind paired with this request kind, if it is a request.
    pub fn reply_kind(&self) -> Option<Self> {
        match self {
            Self::ExecuteRequest => Some(Self::ExecuteReply),
            Self::CompleteRequest => Some(Self::CompleteReply),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message identity stamp.
///
/// An empty header (all fields defaulted) serializes as `{}` and is used as
/// the parent header of unsolicited messages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Unique message id, fresh per minted header.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg_id: String,
    /// Session id, stable for the process lifetime.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session: String,
    /// Configured user name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Protocol version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Mint timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Message kind wire name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg_type: String,
}

impl Header {
    /// Whether this is the empty header.
    pub fn is_empty(&self) -> bool {
        self.msg_id.is_empty() && self.msg_type.is_empty()
    }

    /// Parsed message kind, `None` for unknown kind strings.
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::parse(&self.msg_type)
    }
}

/// The unit of communication.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    /// This message's own identity stamp.
    pub header: Header,
    /// Header of the causing message, or empty if unsolicited.
    pub parent_header: Header,
    /// Reserved extension point, currently always empty.
    pub metadata: serde_json::Map<String, Value>,
    /// Kind-dependent content.
    pub content: Value,
    /// Opaque binary blobs, outside the signed region.
    pub buffers: Vec<Bytes>,
}

impl Message {
    /// Parsed kind of this message, `None` for unknown kind strings.
    pub fn kind(&self) -> Option<MessageKind> {
        self.header.kind()
    }

    /// Deserialize the content into a typed schema.
    pub fn parse_content<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.content.clone())?)
    }
}

/// Reference to the message (or bare header) that causes a new message.
///
/// Composing a reply or broadcast always needs a well-formed parent header;
/// [`Parent::extract`] returns the empty header when there is no cause.
#[derive(Debug, Clone, Copy, Default)]
pub enum Parent<'a> {
    /// Unsolicited message.
    #[default]
    None,
    /// Caused by a message whose bare header is at hand.
    Header(&'a Header),
    /// Caused by a full message.
    Message(&'a Message),
}

impl Parent<'_> {
    /// The causing header, or the empty header when absent.
    pub fn extract(self) -> Header {
        match self {
            Parent::None => Header::default(),
            Parent::Header(h) => h.clone(),
            Parent::Message(m) => m.header.clone(),
        }
    }
}

impl<'a> From<&'a Message> for Parent<'a> {
    fn from(msg: &'a Message) -> Self {
        Parent::Message(msg)
    }
}

impl<'a> From<&'a Header> for Parent<'a> {
    fn from(header: &'a Header) -> Self {
        Parent::Header(header)
    }
}

/// Reply/broadcast status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Request was evaluated successfully.
    Ok,
    /// Request failed.
    Error,
    /// Request was auto-failed behind an earlier failure.
    Aborted,
}

/// Content of an `execute_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Source text to evaluate.
    pub code: String,
}

/// Content of an `execute_reply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteReply {
    pub status: Status,
    pub execution_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evalue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<Vec<String>>,
}

impl ExecuteReply {
    /// Success reply carrying the prompt count.
    pub fn ok(execution_count: u64) -> Self {
        Self {
            status: Status::Ok,
            execution_count,
            etype: None,
            evalue: None,
            traceback: None,
        }
    }
}

/// Content of an `input_echo` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEcho {
    /// Source text about to be evaluated.
    pub code: String,
}

/// Content of an `execute_result` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResult {
    pub execution_count: u64,
    /// Rendered value keyed by mime type.
    pub data: BTreeMap<String, String>,
}

/// Content of an `error` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBroadcast {
    pub status: Status,
    pub etype: String,
    pub evalue: String,
    pub traceback: Vec<String>,
}

/// Content of a `complete_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// Full line being completed.
    pub line: String,
    /// Text fragment at the cursor.
    pub text: String,
}

/// Content of a `complete_reply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteReply {
    pub matches: Vec<String>,
    pub status: Status,
}

/// Content of a reply that auto-fails a queued request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortReply {
    pub status: Status,
}

impl AbortReply {
    pub fn new() -> Self {
        Self {
            status: Status::Aborted,
        }
    }
}

impl Default for AbortReply {
    fn default() -> Self {
        Self::new()
    }
}
