//! Error types for session parsing.

use auth_session_core::ValidationError;
use thiserror::Error;

use crate::report::FailureCode;
use crate::source::SourceError;

/// Conditions that abort a parse call. No partial structure is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input text is empty or whitespace only.
    #[error("input text is empty")]
    EmptyInput,

    /// The parsed structure failed the schema gate.
    #[error(transparent)]
    Schema(#[from] ValidationError),
}

impl ParseError {
    /// Returns `true` for both empty-input and empty-result conditions.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::Schema(ValidationError::EmptyResult(_))
        )
    }

    /// Structured code used in parse reports.
    pub fn failure_code(&self) -> FailureCode {
        match self {
            Self::EmptyInput | Self::Schema(ValidationError::EmptyResult(_)) => {
                FailureCode::EmptyResult
            }
            Self::Schema(ValidationError::MissingRequiredKey { .. }) => {
                FailureCode::MissingRequiredKey
            }
            Self::Schema(ValidationError::UnknownField(_)) => FailureCode::InvalidRequirement,
        }
    }
}

/// Errors from fetch-then-parse helpers.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The raw-text source failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The fetched text did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
