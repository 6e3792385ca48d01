//! Error types for the question-bank layer.

use crate::BankId;

/// Errors that can occur while loading or validating a question bank.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// The provider has no bank under this id.
    #[error("question bank {0} not found")]
    NotFound(BankId),

    /// A bank must contain at least one question.
    #[error("question bank is empty")]
    Empty,

    /// A question failed validation. `index` is 0-based.
    #[error("question {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    /// The JSON document could not be parsed.
    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two banks in one document share an id.
    #[error("duplicate question bank id {0}")]
    DuplicateId(BankId),
}
