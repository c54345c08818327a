//! Candidate invitations.
//!
//! Each invited candidate gets a unique link derived from the
//! assessment and their email (UUID v5, so re-inviting the same address
//! yields the same link instead of a duplicate). Delivery itself is
//! behind the `Notifier` seam; sends are fire-and-forget per recipient
//! and one failure never aborts the batch.

use uuid::Uuid;

use vigil_core::types::{AssessmentDescriptor, CandidateDescriptor, CandidateId};

/// Acknowledgement of an accepted invitation send.
#[derive(Debug, Clone)]
pub struct Ack {
    pub recipient: String,
}

/// Errors from invitation delivery.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Delivery failed for {recipient}: {reason}")]
    Delivery { recipient: String, reason: String },
}

/// Outbound invitation delivery seam.
pub trait Notifier: Send + Sync {
    fn send_invitation(&self, candidate: &CandidateDescriptor) -> Result<Ack, SendError>;
}

/// Stand-in delivery backend: logs the invitation and acknowledges.
/// Real email delivery lives outside this system.
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn send_invitation(&self, candidate: &CandidateDescriptor) -> Result<Ack, SendError> {
        tracing::info!(
            email = %candidate.email,
            invite_link = %candidate.invite_link,
            "Invitation queued for delivery"
        );
        Ok(Ack {
            recipient: candidate.email.clone(),
        })
    }
}

/// Create candidate records with unique invite links for an assessment.
/// Entries are `(email, name)` pairs.
pub fn invite_candidates(
    assessment: &AssessmentDescriptor,
    entries: &[(String, String)],
) -> Vec<CandidateDescriptor> {
    entries
        .iter()
        .map(|(email, name)| CandidateDescriptor {
            candidate_id: CandidateId::new(),
            assessment_id: assessment.assessment_id,
            email: email.clone(),
            name: name.clone(),
            invite_link: invite_link(assessment, email),
            invitation_sent: false,
        })
        .collect()
}

/// Deterministic unique link for one (assessment, email) pair.
fn invite_link(assessment: &AssessmentDescriptor, email: &str) -> String {
    Uuid::new_v5(&assessment.assessment_id.0, email.as_bytes())
        .simple()
        .to_string()
}

/// Send invitations through the notifier, marking successes. Failures
/// are logged and skipped; returns how many sends were acknowledged.
pub fn send_invitations(notifier: &dyn Notifier, candidates: &mut [CandidateDescriptor]) -> usize {
    let mut sent = 0;
    for candidate in candidates.iter_mut() {
        match notifier.send_invitation(candidate) {
            Ok(ack) => {
                candidate.invitation_sent = true;
                sent += 1;
                tracing::debug!(recipient = %ack.recipient, "Invitation acknowledged");
            }
            Err(e) => {
                tracing::warn!(email = %candidate.email, error = %e, "Invitation send failed");
            }
        }
    }
    sent
}
