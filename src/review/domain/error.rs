//! Error types for parsing persisted review vocabularies.

use thiserror::Error;

/// Error returned while parsing a status or remark type from storage or a
/// request payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {vocabulary}: {value}")]
pub struct ParseStatusError {
    /// Vocabulary the value was parsed against.
    pub vocabulary: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseStatusError {
    fn new(vocabulary: &'static str, value: &str) -> Self {
        Self {
            vocabulary,
            value: value.to_owned(),
        }
    }

    pub(crate) fn task(value: &str) -> Self {
        Self::new("task status", value)
    }

    pub(crate) fn test(value: &str) -> Self {
        Self::new("test status", value)
    }

    pub(crate) fn investigation(value: &str) -> Self {
        Self::new("investigation status", value)
    }

    pub(crate) fn remark(value: &str) -> Self {
        Self::new("remark type", value)
    }
}
