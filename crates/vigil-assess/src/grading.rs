//! Grading archived submission records against the answer key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vigil_core::types::{
    AssessmentDescriptor, AssessmentId, CandidateId, CompletionReason, SessionId,
};
use vigil_store::SubmissionRecord;

/// Per-topic correctness breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicBreakdown {
    pub total: usize,
    pub correct: usize,
}

/// The graded result of one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    pub session_id: SessionId,
    pub assessment_id: AssessmentId,
    pub candidate_id: CandidateId,
    pub total_questions: usize,
    pub answered: usize,
    pub correct: usize,
    /// Correct answers over total questions, in percent.
    pub score_percent: f64,
    pub per_topic: BTreeMap<String, TopicBreakdown>,
    /// Carried over from the frozen integrity snapshot.
    pub authenticity_score: u32,
    pub red_flag_count: usize,
    pub completion_reason: CompletionReason,
    pub time_spent_seconds: u64,
}

/// Grade one record against its assessment's answer key.
///
/// Unanswered questions count against the score; answers to questions
/// the assessment no longer carries are ignored.
pub fn grade(assessment: &AssessmentDescriptor, record: &SubmissionRecord) -> GradeReport {
    let mut correct = 0;
    let mut answered = 0;
    let mut per_topic: BTreeMap<String, TopicBreakdown> = BTreeMap::new();

    for question in &assessment.questions {
        let breakdown = per_topic.entry(question.topic.clone()).or_default();
        breakdown.total += 1;

        let answer = record
            .answers
            .iter()
            .find(|a| a.question_id == question.question_id)
            .and_then(|a| a.selected_option);

        if let Some(selected) = answer {
            answered += 1;
            if selected == question.correct_answer {
                correct += 1;
                breakdown.correct += 1;
            }
        }
    }

    let total = assessment.questions.len();
    let score_percent = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    GradeReport {
        session_id: record.session_id,
        assessment_id: record.assessment_id,
        candidate_id: record.candidate_id,
        total_questions: total,
        answered,
        correct,
        score_percent,
        per_topic,
        authenticity_score: record.integrity.authenticity_score,
        red_flag_count: record.integrity.red_flags.len(),
        completion_reason: record.completion_reason,
        time_spent_seconds: record.time_spent_seconds,
    }
}
