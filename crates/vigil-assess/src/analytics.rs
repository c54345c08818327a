//! Per-assessment aggregates for the employer dashboard.

use serde::{Deserialize, Serialize};

use vigil_core::types::CompletionReason;

use crate::grading::GradeReport;

/// Aggregated view over every graded submission of one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentAnalytics {
    /// Number of graded submissions.
    pub responses: usize,
    /// Mean score across submissions, in percent.
    pub average_score: f64,
    /// Correct answers over answered questions, in percent.
    pub accuracy: f64,
    /// Answered questions over total questions, in percent.
    pub completion_rate: f64,
    /// Mean authenticity score across submissions.
    pub average_authenticity: f64,
    /// Submissions whose authenticity score dropped below 100.
    pub flagged_sessions: usize,
    /// Submissions that ran out the clock.
    pub expired_sessions: usize,
}

/// Aggregate graded reports. An empty slice yields all-zero analytics.
pub fn summarize(reports: &[GradeReport]) -> AssessmentAnalytics {
    if reports.is_empty() {
        return AssessmentAnalytics {
            responses: 0,
            average_score: 0.0,
            accuracy: 0.0,
            completion_rate: 0.0,
            average_authenticity: 0.0,
            flagged_sessions: 0,
            expired_sessions: 0,
        };
    }

    let responses = reports.len();
    let total_answered: usize = reports.iter().map(|r| r.answered).sum();
    let total_correct: usize = reports.iter().map(|r| r.correct).sum();
    let total_questions: usize = reports.iter().map(|r| r.total_questions).sum();

    let average_score = reports.iter().map(|r| r.score_percent).sum::<f64>() / responses as f64;
    let accuracy = if total_answered == 0 {
        0.0
    } else {
        total_correct as f64 / total_answered as f64 * 100.0
    };
    let completion_rate = if total_questions == 0 {
        0.0
    } else {
        total_answered as f64 / total_questions as f64 * 100.0
    };
    let average_authenticity = reports
        .iter()
        .map(|r| f64::from(r.authenticity_score))
        .sum::<f64>()
        / responses as f64;

    AssessmentAnalytics {
        responses,
        average_score,
        accuracy,
        completion_rate,
        average_authenticity,
        flagged_sessions: reports.iter().filter(|r| r.authenticity_score < 100).count(),
        expired_sessions: reports
            .iter()
            .filter(|r| r.completion_reason == CompletionReason::TimeExpired)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vigil_core::types::{AssessmentId, CandidateId, SessionId};

    fn report(
        answered: usize,
        correct: usize,
        total: usize,
        authenticity: u32,
        reason: CompletionReason,
    ) -> GradeReport {
        GradeReport {
            session_id: SessionId::new(),
            assessment_id: AssessmentId::new(),
            candidate_id: CandidateId::new(),
            total_questions: total,
            answered,
            correct,
            score_percent: correct as f64 / total as f64 * 100.0,
            per_topic: BTreeMap::new(),
            authenticity_score: authenticity,
            red_flag_count: if authenticity < 100 { 2 } else { 0 },
            completion_reason: reason,
            time_spent_seconds: 1200,
        }
    }

    #[test]
    fn aggregates_across_reports() {
        let reports = vec![
            report(10, 8, 10, 100, CompletionReason::UserSubmitted),
            report(5, 2, 10, 85, CompletionReason::TimeExpired),
        ];

        let analytics = summarize(&reports);
        assert_eq!(analytics.responses, 2);
        // (80 + 20) / 2
        assert!((analytics.average_score - 50.0).abs() < 1e-9);
        // 10 correct of 15 answered
        assert!((analytics.accuracy - 66.666).abs() < 0.01);
        // 15 answered of 20 questions
        assert!((analytics.completion_rate - 75.0).abs() < 1e-9);
        assert!((analytics.average_authenticity - 92.5).abs() < 1e-9);
        assert_eq!(analytics.flagged_sessions, 1);
        assert_eq!(analytics.expired_sessions, 1);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let analytics = summarize(&[]);
        assert_eq!(analytics.responses, 0);
        assert!((analytics.average_score - 0.0).abs() < f64::EPSILON);
        assert!((analytics.accuracy - 0.0).abs() < f64::EPSILON);
        assert_eq!(analytics.flagged_sessions, 0);
    }
}
