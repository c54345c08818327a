//! Core domain types for the Vigil assessment platform.
//!
//! These types describe one candidate's proctored attempt at one
//! assessment, shared across the session engine, the submission store,
//! and the authoring flow.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identifiers ────────────────────────────────────────────────────

/// Unique identifier for one candidate's attempt at one assessment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an assessment (one configured quiz).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssessmentId(pub Uuid);

impl AssessmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssessmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an invited candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CandidateId(pub Uuid);

impl CandidateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QuestionId(pub Uuid);

impl QuestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Question Types ─────────────────────────────────────────────────

/// The fixed option-key set for multiple-choice questions.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::D => write!(f, "D"),
        }
    }
}

impl std::str::FromStr for OptionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(format!("invalid option key: {other}")),
        }
    }
}

/// Question difficulty as shown to the employer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single multiple-choice question with its answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub question_id: QuestionId,
    pub text: String,
    pub options: BTreeMap<OptionKey, String>,
    pub correct_answer: OptionKey,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    pub topic: String,
}

// ── Session ────────────────────────────────────────────────────────

/// Lifecycle state of a session. Submitted and Expired are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitted,
    Expired,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::Expired)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    UserSubmitted,
    TimeExpired,
}

/// Attempted transition out of a terminal state, or a skipped state.
#[derive(Debug, thiserror::Error)]
#[error("invalid session transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// One candidate's attempt at one assessment.
///
/// `question_order` is fixed at creation and never reordered; status
/// transitions follow `NotStarted -> InProgress -> Submitted | Expired`
/// and never leave a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub assessment_id: AssessmentId,
    pub candidate_id: CandidateId,
    pub question_order: Vec<QuestionId>,
    pub started_at: DateTime<Utc>,
    pub duration_limit_seconds: u64,
    pub status: SessionStatus,
}

impl Session {
    /// Create a session in the NotStarted state.
    pub fn new(
        assessment_id: AssessmentId,
        candidate_id: CandidateId,
        question_order: Vec<QuestionId>,
        duration_limit_seconds: u64,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            assessment_id,
            candidate_id,
            question_order,
            started_at: Utc::now(),
            duration_limit_seconds,
            status: SessionStatus::NotStarted,
        }
    }

    /// Transition NotStarted -> InProgress, stamping the start time.
    pub fn begin(&mut self) -> Result<(), InvalidTransition> {
        if self.status != SessionStatus::NotStarted {
            return Err(InvalidTransition {
                from: self.status,
                to: SessionStatus::InProgress,
            });
        }
        self.started_at = Utc::now();
        self.status = SessionStatus::InProgress;
        Ok(())
    }

    /// Transition InProgress -> Submitted | Expired. Terminal states are
    /// final: any further transition attempt is rejected.
    pub fn finish(&mut self, reason: CompletionReason) -> Result<(), InvalidTransition> {
        let to = match reason {
            CompletionReason::UserSubmitted => SessionStatus::Submitted,
            CompletionReason::TimeExpired => SessionStatus::Expired,
        };
        if self.status != SessionStatus::InProgress {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::InProgress
    }
}

// ── Answers ────────────────────────────────────────────────────────

/// One candidate response. Unique per question; overwritten on re-answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntry {
    pub question_id: QuestionId,
    pub selected_option: Option<OptionKey>,
    pub flagged_for_review: bool,
}

impl AnswerEntry {
    pub fn unanswered(question_id: QuestionId) -> Self {
        Self {
            question_id,
            selected_option: None,
            flagged_for_review: false,
        }
    }
}

// ── Integrity ──────────────────────────────────────────────────────

/// Severity of an integrity observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Which component raised a flag. The two counters are kept distinct
/// so reports can separate camera anomalies from browser tampering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlagOrigin {
    Monitor,
    Guard,
}

/// A discrete integrity-violation observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedFlag {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub severity: Severity,
    pub origin: FlagOrigin,
}

impl RedFlag {
    pub fn new(description: impl Into<String>, severity: Severity, origin: FlagOrigin) -> Self {
        Self {
            timestamp: Utc::now(),
            description: description.into(),
            severity,
            origin,
        }
    }
}

/// Accumulated trust signal for a session.
///
/// `red_flags` is append-only; `authenticity_score` starts at 100 and is
/// only ever recomputed downward from the flag counters. Info-severity
/// flags are logged but never scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrityState {
    pub authenticity_score: u32,
    pub attention_score: u32,
    pub red_flags: Vec<RedFlag>,
    pub monitor_flag_count: u32,
    pub guard_flag_count: u32,
    pub face_detection_rate: f64,
    pub total_checks: u32,
    pub successful_detections: u32,
    pub permission_denied: bool,
}

impl IntegrityState {
    pub fn new() -> Self {
        Self {
            authenticity_score: 100,
            attention_score: 100,
            red_flags: Vec::new(),
            monitor_flag_count: 0,
            guard_flag_count: 0,
            face_detection_rate: 1.0,
            total_checks: 0,
            successful_detections: 0,
            permission_denied: false,
        }
    }

    /// Append a flag and recompute the scores with the given per-flag
    /// penalty. Warning and Error flags count toward their origin's
    /// counter; Info flags are stored in the log only.
    pub fn record_flag(&mut self, flag: RedFlag, penalty: u32) {
        if flag.severity != Severity::Info {
            match flag.origin {
                FlagOrigin::Monitor => self.monitor_flag_count += 1,
                FlagOrigin::Guard => self.guard_flag_count += 1,
            }
        }
        self.red_flags.push(flag);
        self.recompute(penalty);
    }

    /// Whether the most recent flag in the log carries this description.
    /// Used to deduplicate streaks of the same camera anomaly.
    pub fn latest_flag_is(&self, description: &str) -> bool {
        self.red_flags
            .last()
            .map(|f| f.description == description)
            .unwrap_or(false)
    }

    /// Update the face-detection aggregate after one detector check.
    pub fn record_face_check(&mut self, detected: bool) {
        self.total_checks += 1;
        if detected {
            self.successful_detections += 1;
        }
        self.face_detection_rate = f64::from(self.successful_detections) / f64::from(self.total_checks);
    }

    fn recompute(&mut self, penalty: u32) {
        let flagged = self.monitor_flag_count + self.guard_flag_count;
        self.authenticity_score = 100u32.saturating_sub(penalty * flagged);
        self.attention_score = 100u32.saturating_sub(penalty * self.monitor_flag_count);
    }
}

impl Default for IntegrityState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Assessment & Candidate ─────────────────────────────────────────

/// A configured assessment as loaded for a candidate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentDescriptor {
    pub assessment_id: AssessmentId,
    pub title: String,
    pub job_description: Option<String>,
    pub questions: Vec<QuestionSpec>,
    pub duration_seconds: u64,
    pub deadline: Option<DateTime<Utc>>,
}

impl AssessmentDescriptor {
    /// The fixed question order a session is created with.
    pub fn question_order(&self) -> Vec<QuestionId> {
        self.questions.iter().map(|q| q.question_id).collect()
    }

    pub fn question(&self, id: QuestionId) -> Option<&QuestionSpec> {
        self.questions.iter().find(|q| q.question_id == id)
    }
}

/// An invited candidate, reachable through a unique link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDescriptor {
    pub candidate_id: CandidateId,
    pub assessment_id: AssessmentId,
    pub email: String,
    pub name: String,
    pub invite_link: String,
    pub invitation_sent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_transitions_respect_terminal_states() {
        let mut session = Session::new(
            AssessmentId::new(),
            CandidateId::new(),
            vec![QuestionId::new()],
            2700,
        );
        assert_eq!(session.status, SessionStatus::NotStarted);

        session.begin().unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);

        // Starting twice is rejected.
        assert!(session.begin().is_err());

        session.finish(CompletionReason::UserSubmitted).unwrap();
        assert_eq!(session.status, SessionStatus::Submitted);
        assert!(session.status.is_terminal());

        // No transition leaves a terminal state.
        assert!(session.finish(CompletionReason::TimeExpired).is_err());
        assert!(session.begin().is_err());
        assert_eq!(session.status, SessionStatus::Submitted);
    }

    #[test]
    fn expiry_is_terminal() {
        let mut session = Session::new(AssessmentId::new(), CandidateId::new(), vec![], 60);
        session.begin().unwrap();
        session.finish(CompletionReason::TimeExpired).unwrap();
        assert_eq!(session.status, SessionStatus::Expired);
        assert!(session.finish(CompletionReason::UserSubmitted).is_err());
    }

    #[test]
    fn integrity_scoring_counts_only_warning_and_error() {
        let mut state = IntegrityState::new();
        assert_eq!(state.authenticity_score, 100);

        state.record_flag(
            RedFlag::new("No face detected", Severity::Warning, FlagOrigin::Monitor),
            5,
        );
        assert_eq!(state.authenticity_score, 95);
        assert_eq!(state.attention_score, 95);

        state.record_flag(
            RedFlag::new("Not in fullscreen mode", Severity::Info, FlagOrigin::Monitor),
            5,
        );
        assert_eq!(state.red_flags.len(), 2);
        assert_eq!(state.monitor_flag_count, 1);
        assert_eq!(state.authenticity_score, 95);

        state.record_flag(
            RedFlag::new(
                "Right-click context menu attempted",
                Severity::Warning,
                FlagOrigin::Guard,
            ),
            5,
        );
        assert_eq!(state.guard_flag_count, 1);
        assert_eq!(state.authenticity_score, 90);
        // Guard flags do not touch the attention aggregate.
        assert_eq!(state.attention_score, 95);
    }

    #[test]
    fn authenticity_score_clamps_at_zero() {
        let mut state = IntegrityState::new();
        for _ in 0..30 {
            state.record_flag(
                RedFlag::new("Looking away from screen", Severity::Warning, FlagOrigin::Monitor),
                5,
            );
        }
        assert_eq!(state.authenticity_score, 0);
        assert_eq!(state.red_flags.len(), 30);
    }

    #[test]
    fn face_detection_rate_tracks_checks() {
        let mut state = IntegrityState::new();
        state.record_face_check(true);
        state.record_face_check(true);
        state.record_face_check(false);
        state.record_face_check(true);
        assert_eq!(state.total_checks, 4);
        assert!((state.face_detection_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn option_key_serializes_bare() {
        assert_eq!(serde_json::to_string(&OptionKey::B).unwrap(), "\"B\"");
        let parsed: OptionKey = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(parsed, OptionKey::D);
        assert_eq!("c".parse::<OptionKey>().unwrap(), OptionKey::C);
        assert!("E".parse::<OptionKey>().is_err());
    }

    #[test]
    fn session_serialization_roundtrip() {
        let session = Session::new(
            AssessmentId::new(),
            CandidateId::new(),
            vec![QuestionId::new(), QuestionId::new()],
            2700,
        );
        let json = serde_json::to_string(&session).unwrap();
        let deserialized: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(session.session_id, deserialized.session_id);
        assert_eq!(session.question_order, deserialized.question_order);
        assert_eq!(deserialized.status, SessionStatus::NotStarted);
    }
}
