//! Protocol module - message model and multipart wire format.
//!
//! This module implements the logical message layer:
//! - Typed headers, message kinds, and per-kind content schemas
//! - Wire codec packing a message to/from an ordered frame sequence

mod message;
mod wire;

pub use message::{
    AbortReply, CompleteReply, CompleteRequest, ErrorBroadcast, ExecuteReply, ExecuteRequest,
    ExecuteResult, Header, InputEcho, Message, MessageKind, Parent, Status, PROTOCOL_VERSION,
};
pub use wire::{WireCodec, WireMessage, DELIM};
