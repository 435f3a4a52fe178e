//! Dispatch loop.
//!
//! The kernel services the routed request channel single-threaded and
//! strictly FIFO: one blocking receive per iteration, one evaluation slot,
//! all broadcasts caused by a request emitted before that request's reply.
//!
//! Failure isolation follows the taxonomy in the protocol design:
//! - transport/decode/signature failures drop the unit, log, and continue;
//! - unknown message kinds are dropped without a reply;
//! - evaluation failures become an `error` broadcast plus an error reply,
//!   and the requests already queued behind the failure are auto-failed
//!   with `aborted` replies before normal service resumes.

mod handlers;

pub use handlers::{builtin_table, HandlerKind};

use std::collections::HashMap;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec::JsonCodec;
use crate::engine::{Completer, ExecutionEngine, PlainTextSink, ResultSink};
use crate::error::{KernelError, Result};
use crate::protocol::{
    AbortReply, CompleteReply, CompleteRequest, ErrorBroadcast, ExecuteReply, ExecuteRequest,
    ExecuteResult, InputEcho, Message, MessageKind, Status, WireMessage,
};
use crate::session::Session;
use crate::transport::Channel;

/// Kernel-side endpoint: owns the request and broadcast channels, the
/// execution engine, and the prompt counter.
pub struct Kernel<S: Channel, P: Channel> {
    session: Session,
    shell: S,
    iopub: P,
    engine: Box<dyn ExecutionEngine>,
    completer: Option<Box<dyn Completer>>,
    sink: Box<dyn ResultSink>,
    handlers: HashMap<MessageKind, HandlerKind>,
    execution_count: u64,
}

impl<S: Channel, P: Channel> Kernel<S, P> {
    /// Build a kernel over already-open channels.
    pub fn new(session: Session, shell: S, iopub: P, engine: Box<dyn ExecutionEngine>) -> Self {
        Self {
            session,
            shell,
            iopub,
            engine,
            completer: None,
            sink: Box::new(PlainTextSink),
            handlers: builtin_table(),
            execution_count: 0,
        }
    }

    /// Wire a completer for `complete_request` handling.
    pub fn with_completer(mut self, completer: Box<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Replace the result sink used to render evaluated values.
    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Number of successfully evaluated requests so far.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Run the dispatch loop until the request channel closes.
    ///
    /// This is the only blocking point of the loop; everything after a
    /// receive runs to completion before the next receive.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let wire = match self.session.recv(&mut self.shell).await {
                Ok(wire) => wire,
                Err(KernelError::ChannelClosed) => {
                    debug!("request channel closed, stopping dispatch loop");
                    return Ok(());
                }
                Err(e) => {
                    // Malformed or unauthenticated unit: drop and continue.
                    warn!(error = %e, "dropping undecodable request");
                    continue;
                }
            };
            self.dispatch(wire).await?;
        }
    }

    /// Dispatch one decoded request to its handler.
    async fn dispatch(&mut self, wire: WireMessage) -> Result<()> {
        let Some(kind) = wire.message.kind() else {
            warn!(
                msg_type = %wire.message.header.msg_type,
                "dropping message of unknown kind"
            );
            return Ok(());
        };
        let Some(handler) = self.handlers.get(&kind).copied() else {
            warn!(%kind, "no handler registered, dropping message");
            return Ok(());
        };

        debug!(%kind, msg_id = %wire.message.header.msg_id, "dispatching request");
        match handler {
            HandlerKind::Execute => self.execute_request(&wire.identities, &wire.message).await,
            HandlerKind::Complete => self.complete_request(&wire.identities, &wire.message).await,
        }
    }

    /// Handle an `execute_request`.
    ///
    /// Broadcasts the input echo before evaluation so every observer sees
    /// what is about to run, then either a result or an error broadcast,
    /// then the reply on the same routing identities the request arrived
    /// with. An error reply is followed by draining the queue.
    async fn execute_request(&mut self, identities: &[Bytes], request: &Message) -> Result<()> {
        let Some(code) = extract_code(request) else {
            warn!(
                msg_id = %request.header.msg_id,
                "dropping execute request without code"
            );
            return Ok(());
        };

        self.broadcast(
            MessageKind::InputEcho,
            &InputEcho { code: code.clone() },
            request,
        )
        .await?;

        match self.engine.evaluate(&code) {
            Ok(value) => {
                self.execution_count += 1;
                if let Some(value) = value {
                    let result = ExecuteResult {
                        execution_count: self.execution_count,
                        data: self.sink.render(&value),
                    };
                    self.broadcast(MessageKind::ExecuteResult, &result, request)
                        .await?;
                }
                self.reply(
                    identities,
                    MessageKind::ExecuteReply,
                    &ExecuteReply::ok(self.execution_count),
                    request,
                )
                .await
            }
            Err(diagnostic) => {
                self.broadcast(
                    MessageKind::Error,
                    &ErrorBroadcast {
                        status: Status::Error,
                        etype: diagnostic.etype.clone(),
                        evalue: diagnostic.evalue.clone(),
                        traceback: diagnostic.traceback.clone(),
                    },
                    request,
                )
                .await?;
                self.reply(
                    identities,
                    MessageKind::ExecuteReply,
                    &ExecuteReply {
                        status: Status::Error,
                        execution_count: self.execution_count,
                        etype: Some(diagnostic.etype),
                        evalue: Some(diagnostic.evalue),
                        traceback: Some(diagnostic.traceback),
                    },
                    request,
                )
                .await?;
                self.drain_aborted().await
            }
        }
    }

    /// Handle a `complete_request`.
    ///
    /// Fails closed when no completer is wired: the front-end gets a
    /// definite error reply instead of silence.
    async fn complete_request(&mut self, identities: &[Bytes], request: &Message) -> Result<()> {
        let req: CompleteRequest = match request.parse_content() {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "dropping complete request with bad content");
                return Ok(());
            }
        };

        let content = match &self.completer {
            Some(completer) => CompleteReply {
                matches: completer.complete(&req.line, &req.text),
                status: Status::Ok,
            },
            None => {
                warn!("no completer wired, completion unavailable");
                CompleteReply {
                    matches: Vec::new(),
                    status: Status::Error,
                }
            }
        };

        self.reply(identities, MessageKind::CompleteReply, &content, request)
            .await
    }

    /// Auto-fail every request already queued behind a failed one.
    ///
    /// Each queued request gets a reply of its own paired reply kind with
    /// status `aborted` and its own header as parent, so dependent pipelines
    /// are never silently part-evaluated. Stops at the first empty poll.
    async fn drain_aborted(&mut self) -> Result<()> {
        loop {
            let wire = match self.session.try_recv(&mut self.shell).await {
                Ok(Some(wire)) => wire,
                Ok(None) => return Ok(()),
                Err(KernelError::ChannelClosed) => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "dropping undecodable queued request during abort");
                    continue;
                }
            };

            let Some(reply_kind) = wire.message.kind().and_then(|k| k.reply_kind()) else {
                warn!(
                    msg_type = %wire.message.header.msg_type,
                    "dropping non-request message during abort"
                );
                continue;
            };

            debug!(msg_id = %wire.message.header.msg_id, "aborting queued request");
            self.reply(
                &wire.identities,
                reply_kind,
                &AbortReply::new(),
                &wire.message,
            )
            .await?;
        }
    }

    /// Publish a broadcast caused by `parent`.
    async fn broadcast<T: serde::Serialize>(
        &mut self,
        kind: MessageKind,
        content: &T,
        parent: &Message,
    ) -> Result<()> {
        let message = self.session.message(kind, content, parent)?;
        self.session.send(&mut self.iopub, &message, &[]).await
    }

    /// Send a reply to the routing identities the request arrived with.
    async fn reply<T: serde::Serialize>(
        &mut self,
        identities: &[Bytes],
        kind: MessageKind,
        content: &T,
        parent: &Message,
    ) -> Result<()> {
        let message = self.session.message(kind, content, parent)?;
        self.session.send(&mut self.shell, &message, identities).await
    }
}

/// Source text of an execute request: `content.code`, or the first buffer
/// parsed as a JSON `{code}` object when the content carries none.
fn extract_code(request: &Message) -> Option<String> {
    if let Ok(req) = request.parse_content::<ExecuteRequest>() {
        return Some(req.code);
    }
    let buffer = request.buffers.first()?;
    JsonCodec::decode::<ExecuteRequest>(buffer)
        .ok()
        .map(|req| req.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Header;
    use serde_json::json;

    #[test]
    fn test_extract_code_from_content() {
        let request = Message {
            content: json!({"code": "1+1"}),
            ..Message::default()
        };
        assert_eq!(extract_code(&request).as_deref(), Some("1+1"));
    }

    #[test]
    fn test_extract_code_from_buffer() {
        let request = Message {
            content: json!({}),
            buffers: vec![Bytes::from_static(b"{\"code\": \"2*2\"}")],
            ..Message::default()
        };
        assert_eq!(extract_code(&request).as_deref(), Some("2*2"));
    }

    #[test]
    fn test_extract_code_missing() {
        let request = Message {
            header: Header::default(),
            content: json!({}),
            ..Message::default()
        };
        assert_eq!(extract_code(&request), None);

        let request = Message {
            content: json!({}),
            buffers: vec![Bytes::from_static(b"not json")],
            ..Message::default()
        };
        assert_eq!(extract_code(&request), None);
    }
}
