//! Assessment and candidate lookup behind unique invite links.
//!
//! The session engine only ever sees this trait; the JSON-directory
//! implementation below backs the CLI and tests. Deadlines are enforced
//! at load time so an expired link never reaches the instructions page.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use vigil_core::types::{AssessmentDescriptor, AssessmentId, CandidateDescriptor};

/// Errors from assessment/candidate lookup.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("No candidate found for link: {0}")]
    UnknownLink(String),

    #[error("Assessment deadline passed at {deadline}")]
    LinkExpired { deadline: DateTime<Utc> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Lookup contract for the session-creation flow.
pub trait AssessmentRepo {
    /// Resolve an invite link to its candidate.
    fn load_candidate(&self, link: &str) -> Result<CandidateDescriptor, RepoError>;

    /// Resolve an invite link to the assessment it grants, rejecting
    /// links whose assessment deadline has passed.
    fn load_assessment(&self, link: &str) -> Result<AssessmentDescriptor, RepoError>;
}

/// JSON-directory repo:
/// ```text
/// {root}/
///   assessments/{assessment_id}.json
///   candidates/{invite_link}.json
/// ```
pub struct JsonAssessmentRepo {
    root: PathBuf,
}

impl JsonAssessmentRepo {
    /// Open (or create) a repo rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let root = root.into();
        fs::create_dir_all(root.join("assessments"))?;
        fs::create_dir_all(root.join("candidates"))?;
        Ok(Self { root })
    }

    /// Persist an assessment descriptor.
    pub fn save_assessment(&self, assessment: &AssessmentDescriptor) -> Result<(), RepoError> {
        let path = self
            .root
            .join("assessments")
            .join(format!("{}.json", assessment.assessment_id.0));
        fs::write(&path, serde_json::to_string_pretty(assessment)?)?;
        tracing::debug!(
            assessment_id = %assessment.assessment_id,
            path = %path.display(),
            "Assessment saved"
        );
        Ok(())
    }

    /// Persist a candidate descriptor, keyed by their invite link.
    pub fn save_candidate(&self, candidate: &CandidateDescriptor) -> Result<(), RepoError> {
        let path = self
            .root
            .join("candidates")
            .join(format!("{}.json", candidate.invite_link));
        fs::write(&path, serde_json::to_string_pretty(candidate)?)?;
        Ok(())
    }

    /// Load an assessment directly by its ID (employer-side flows).
    pub fn assessment_by_id(&self, id: AssessmentId) -> Result<AssessmentDescriptor, RepoError> {
        let path = self.root.join("assessments").join(format!("{}.json", id.0));
        if !path.is_file() {
            return Err(RepoError::UnknownLink(id.to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }

    fn read_assessment(
        &self,
        candidate: &CandidateDescriptor,
    ) -> Result<AssessmentDescriptor, RepoError> {
        self.assessment_by_id(candidate.assessment_id)
            .map_err(|e| match e {
                RepoError::UnknownLink(_) => RepoError::UnknownLink(candidate.invite_link.clone()),
                other => other,
            })
    }
}

impl AssessmentRepo for JsonAssessmentRepo {
    fn load_candidate(&self, link: &str) -> Result<CandidateDescriptor, RepoError> {
        let path = self.root.join("candidates").join(format!("{link}.json"));
        if !path.is_file() {
            return Err(RepoError::UnknownLink(link.to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }

    fn load_assessment(&self, link: &str) -> Result<AssessmentDescriptor, RepoError> {
        let candidate = self.load_candidate(link)?;
        let assessment = self.read_assessment(&candidate)?;

        if let Some(deadline) = assessment.deadline {
            if Utc::now() > deadline {
                return Err(RepoError::LinkExpired { deadline });
            }
        }

        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vigil_core::types::{AssessmentId, CandidateId};

    fn sample_assessment(deadline: Option<DateTime<Utc>>) -> AssessmentDescriptor {
        AssessmentDescriptor {
            assessment_id: AssessmentId::new(),
            title: "Backend Engineer Screen".to_string(),
            job_description: None,
            questions: Vec::new(),
            duration_seconds: 2700,
            deadline,
        }
    }

    fn sample_candidate(assessment_id: AssessmentId, link: &str) -> CandidateDescriptor {
        CandidateDescriptor {
            candidate_id: CandidateId::new(),
            assessment_id,
            email: "dev@example.com".to_string(),
            name: "Jordan Example".to_string(),
            invite_link: link.to_string(),
            invitation_sent: true,
        }
    }

    #[test]
    fn resolves_link_to_assessment() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonAssessmentRepo::new(dir.path()).unwrap();

        let assessment = sample_assessment(None);
        let candidate = sample_candidate(assessment.assessment_id, "link-abc");
        repo.save_assessment(&assessment).unwrap();
        repo.save_candidate(&candidate).unwrap();

        let loaded = repo.load_assessment("link-abc").unwrap();
        assert_eq!(loaded.assessment_id, assessment.assessment_id);
        assert_eq!(loaded.duration_seconds, 2700);

        let loaded_candidate = repo.load_candidate("link-abc").unwrap();
        assert_eq!(loaded_candidate.email, "dev@example.com");
    }

    #[test]
    fn unknown_link_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonAssessmentRepo::new(dir.path()).unwrap();
        assert!(matches!(
            repo.load_assessment("nope"),
            Err(RepoError::UnknownLink(_))
        ));
    }

    #[test]
    fn expired_deadline_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonAssessmentRepo::new(dir.path()).unwrap();

        let assessment = sample_assessment(Some(Utc::now() - Duration::hours(1)));
        let candidate = sample_candidate(assessment.assessment_id, "late-link");
        repo.save_assessment(&assessment).unwrap();
        repo.save_candidate(&candidate).unwrap();

        assert!(matches!(
            repo.load_assessment("late-link"),
            Err(RepoError::LinkExpired { .. })
        ));
        // The candidate record itself stays resolvable for messaging.
        assert!(repo.load_candidate("late-link").is_ok());
    }
}
