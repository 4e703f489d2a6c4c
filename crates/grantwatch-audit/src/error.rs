//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur while decoding an audit log payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid JSON or did not match the event schema.
    #[error("malformed audit log payload ({category}) at line {line} column {column}: {source}")]
    MalformedPayload {
        category: &'static str,
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The payload was empty.
    #[error("malformed audit log payload: empty body")]
    Empty,
}

impl From<serde_json::Error> for DecodeError {
    fn from(source: serde_json::Error) -> Self {
        let category = match source.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "schema",
            serde_json::error::Category::Eof => "truncated",
        };
        Self::MalformedPayload {
            category,
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}
