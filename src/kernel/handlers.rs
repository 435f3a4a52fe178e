//! Dispatch table for request kinds.
//!
//! Built once at startup and read-only afterwards. Handlers are a closed
//! tagged set rather than boxed callables: the dispatch loop matches on
//! [`HandlerKind`] and calls the corresponding kernel method, which keeps
//! exclusive access to the evaluation namespace and prompt counter simple.

use std::collections::HashMap;

use crate::protocol::MessageKind;

/// Built-in request handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Evaluate source text.
    Execute,
    /// Complete an input fragment.
    Complete,
}

/// The handler table used by a freshly built kernel.
pub fn builtin_table() -> HashMap<MessageKind, HandlerKind> {
    let mut table = HashMap::new();
    table.insert(MessageKind::ExecuteRequest, HandlerKind::Execute);
    table.insert(MessageKind::CompleteRequest, HandlerKind::Complete);
    table
}
