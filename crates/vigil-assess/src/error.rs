//! Error types for the vigil-assess crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssessError {
    #[error("Not enough questions for topic {topic}: requested {requested}, available {available}")]
    InsufficientQuestions {
        topic: String,
        requested: usize,
        available: usize,
    },

    #[error("Assessment has no questions")]
    EmptyAssessment,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssessError>;
