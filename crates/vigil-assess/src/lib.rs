//! vigil-assess: Assessment authoring and review for the Vigil platform.
//!
//! Everything the employer side needs around the session engine:
//! building assessments from a question bank, inviting candidates with
//! unique links, grading archived submission records, and aggregating
//! per-assessment analytics.

pub mod analytics;
pub mod bank;
pub mod builder;
pub mod error;
pub mod grading;
pub mod invite;

pub use error::AssessError;
