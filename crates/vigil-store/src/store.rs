//! Submission storage — trait + filesystem implementation.
//!
//! Records are stored as JSON files organized by completion date and
//! session ID, suitable for backup tooling or a sync job to a hosted
//! database (the hand-off beyond the local archive is out of scope).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use vigil_core::types::{AssessmentId, CandidateId, SessionId};

use crate::SubmissionRecord;

/// Errors that can occur during submission storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Submission not found for session: {0}")]
    NotFound(SessionId),

    #[error("Integrity check failed for session {0}: stored hash does not match content")]
    IntegrityViolation(SessionId),

    #[error("Submission record has no content hash (not finalized)")]
    NotFinalized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query parameters for listing submissions.
#[derive(Debug, Default)]
pub struct SubmissionQuery {
    /// Filter by assessment.
    pub assessment_id: Option<AssessmentId>,
    /// Filter by candidate.
    pub candidate_id: Option<CandidateId>,
    /// Only include submissions completed at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only include submissions completed at or before this time.
    pub to: Option<DateTime<Utc>>,
}

/// Trait for submission persistence backends.
///
/// The session engine hands each finalized record to an implementation
/// exactly once and retains the record in memory if the hand-off fails;
/// it never retries on its own.
pub trait SubmissionStore: Send + Sync {
    /// Store a finalized record. Returns an error if the record has no
    /// content hash.
    fn save(&self, record: &SubmissionRecord) -> Result<(), StoreError>;

    /// Retrieve a record by session ID, verifying integrity.
    fn get(&self, id: SessionId) -> Result<SubmissionRecord, StoreError>;

    /// List records matching the given query, newest first.
    fn list(&self, query: &SubmissionQuery) -> Result<Vec<SubmissionRecord>, StoreError>;
}

/// File-system backed submission store.
///
/// Stores records as JSON files in a directory tree:
/// ```text
/// {root}/
///   2026/
///     08/
///       08/
///         {session_id}.json
/// ```
pub struct JsonSubmissionStore {
    root: PathBuf,
}

impl JsonSubmissionStore {
    /// Create a new store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Build the file path for a record based on its completion date and ID.
    fn record_path(&self, record: &SubmissionRecord) -> PathBuf {
        let date = record.completed_at.format("%Y/%m/%d");
        self.root.join(format!("{}/{}.json", date, record.session_id.0))
    }

    /// Locate a record file by session ID by scanning the directory tree.
    fn find_path(&self, id: SessionId) -> Result<PathBuf, StoreError> {
        let filename = format!("{}.json", id.0);
        find_file_recursive(&self.root, &filename).ok_or(StoreError::NotFound(id))
    }
}

impl SubmissionStore for JsonSubmissionStore {
    fn save(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        if record.content_hash.is_none() {
            return Err(StoreError::NotFinalized);
        }

        let path = self.record_path(record);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;

        tracing::debug!(
            session_id = %record.session_id,
            path = %path.display(),
            "Submission record archived"
        );

        Ok(())
    }

    fn get(&self, id: SessionId) -> Result<SubmissionRecord, StoreError> {
        let path = self.find_path(id)?;
        let json = fs::read_to_string(&path)?;
        let record: SubmissionRecord = serde_json::from_str(&json)?;

        if !record.verify_integrity() {
            return Err(StoreError::IntegrityViolation(id));
        }

        Ok(record)
    }

    fn list(&self, query: &SubmissionQuery) -> Result<Vec<SubmissionRecord>, StoreError> {
        let mut results = Vec::new();
        collect_records_recursive(&self.root, query, &mut results)?;

        // Newest first.
        results.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        Ok(results)
    }
}

/// Recursively find a file by name.
fn find_file_recursive(dir: &Path, filename: &str) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_recursive(&path, filename) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            return Some(path);
        }
    }

    None
}

/// Recursively collect records matching a query.
fn collect_records_recursive(
    dir: &Path,
    query: &SubmissionQuery,
    results: &mut Vec<SubmissionRecord>,
) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_records_recursive(&path, query, results)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let json = fs::read_to_string(&path)?;
            let record: SubmissionRecord = serde_json::from_str(&json)?;

            if matches_query(&record, query) {
                results.push(record);
            }
        }
    }

    Ok(())
}

/// Check whether a record matches the given query filters.
fn matches_query(record: &SubmissionRecord, query: &SubmissionQuery) -> bool {
    if let Some(aid) = &query.assessment_id {
        if &record.assessment_id != aid {
            return false;
        }
    }
    if let Some(cid) = &query.candidate_id {
        if &record.candidate_id != cid {
            return false;
        }
    }
    if let Some(from) = &query.from {
        if &record.completed_at < from {
            return false;
        }
    }
    if let Some(to) = &query.to {
        if &record.completed_at > to {
            return false;
        }
    }
    true
}
