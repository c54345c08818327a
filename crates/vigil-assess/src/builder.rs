//! Assessment construction.
//!
//! Builds an `AssessmentDescriptor` with a fixed question order from
//! hand-picked questions and/or random topic draws out of the bank.

use chrono::{DateTime, Utc};

use vigil_core::types::{AssessmentDescriptor, AssessmentId, QuestionSpec};

use crate::bank::QuestionBank;
use crate::error::{AssessError, Result};

/// 45 minutes, the product default for a screening round.
const DEFAULT_DURATION_SECONDS: u64 = 45 * 60;

/// Builder for one assessment.
pub struct AssessmentBuilder {
    title: String,
    job_description: Option<String>,
    duration_seconds: u64,
    deadline: Option<DateTime<Utc>>,
    questions: Vec<QuestionSpec>,
}

impl AssessmentBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            job_description: None,
            duration_seconds: DEFAULT_DURATION_SECONDS,
            deadline: None,
            questions: Vec::new(),
        }
    }

    pub fn job_description(mut self, text: impl Into<String>) -> Self {
        self.job_description = Some(text.into());
        self
    }

    pub fn duration_seconds(mut self, seconds: u64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Append hand-picked questions in order.
    pub fn questions(mut self, questions: impl IntoIterator<Item = QuestionSpec>) -> Self {
        self.questions.extend(questions);
        self
    }

    /// Draw `count` random questions for `topic` from the bank.
    pub fn random_from_bank(
        mut self,
        bank: &QuestionBank,
        topic: &str,
        count: usize,
    ) -> Result<Self> {
        self.questions.extend(bank.assign_random(topic, count)?);
        Ok(self)
    }

    /// Finish the assessment. The question order is fixed from here on.
    pub fn build(self) -> Result<AssessmentDescriptor> {
        if self.questions.is_empty() {
            return Err(AssessError::EmptyAssessment);
        }

        let assessment = AssessmentDescriptor {
            assessment_id: AssessmentId::new(),
            title: self.title,
            job_description: self.job_description,
            questions: self.questions,
            duration_seconds: self.duration_seconds,
            deadline: self.deadline,
        };

        tracing::info!(
            assessment_id = %assessment.assessment_id,
            questions = assessment.questions.len(),
            duration_seconds = assessment.duration_seconds,
            "Assessment created"
        );
        Ok(assessment)
    }
}
