//! vigil-core: Shared types, configuration, and error handling for the Vigil platform.
//!
//! This crate provides the foundational types used across all Vigil components:
//! - Session types (Session, AnswerEntry, IntegrityState) for the session engine
//! - Assessment types (AssessmentDescriptor, QuestionSpec, CandidateDescriptor)
//! - Event types for observer notification
//! - Engine configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::VigilError;
