use thiserror::Error;

/// Errors raised while interpreting sweep data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown classification: {0}")]
    UnknownClassification(String),

    #[error("Malformed log line: {0:?}")]
    MalformedLogLine(String),
}
