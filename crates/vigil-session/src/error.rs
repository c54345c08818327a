//! Error types for the vigil-session crate.

use thiserror::Error;

use vigil_core::types::QuestionId;
use vigil_store::store::StoreError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unknown question id: {0}")]
    InvalidQuestion(QuestionId),

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session is not in progress")]
    NotActive,

    #[error("No submission record has been assembled yet")]
    NoRecord,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
