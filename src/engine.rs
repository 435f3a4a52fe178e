//! External collaborators of the dispatch loop.
//!
//! The kernel core does not evaluate code itself. It drives an
//! [`ExecutionEngine`] for evaluation, an optional [`Completer`] for
//! tab-completion, and a [`ResultSink`] for rendering evaluated values into
//! display data. All three are passed in explicitly at construction; there
//! is no ambient global hook.

use std::collections::BTreeMap;

use thiserror::Error;

/// Diagnostic raised by the execution engine for a failed evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{etype}: {evalue}")]
pub struct EvaluationError {
    /// Error kind name.
    pub etype: String,
    /// Error message.
    pub evalue: String,
    /// Backtrace lines.
    pub traceback: Vec<String>,
}

/// Evaluates source text against a mutable namespace.
///
/// The call is synchronous and blocking: the dispatch loop holds the single
/// evaluation slot while it runs.
pub trait ExecutionEngine: Send {
    /// Evaluate `code`, returning the rendered value of the final
    /// expression, or `None` when the evaluation produced no value.
    fn evaluate(&mut self, code: &str) -> std::result::Result<Option<String>, EvaluationError>;
}

/// Produces completion candidates for an input fragment.
pub trait Completer: Send {
    /// Matches for `text` at the cursor position within `line`.
    fn complete(&self, line: &str, text: &str) -> Vec<String>;
}

/// Renders an evaluated value into mime-keyed display data.
pub trait ResultSink: Send {
    /// Display data for `value`, keyed by mime type.
    fn render(&mut self, value: &str) -> BTreeMap<String, String>;
}

/// Default sink: render every value as `text/plain`.
#[derive(Debug, Default)]
pub struct PlainTextSink;

impl ResultSink for PlainTextSink {
    fn render(&mut self, value: &str) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        data.insert("text/plain".to_string(), value.to_string());
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_sink() {
        let mut sink = PlainTextSink;
        let data = sink.render("2");
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("text/plain").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_evaluation_error_display() {
        let err = EvaluationError {
            etype: "Boom".to_string(),
            evalue: "it broke".to_string(),
            traceback: vec![],
        };
        assert_eq!(err.to_string(), "Boom: it broke");
    }
}
