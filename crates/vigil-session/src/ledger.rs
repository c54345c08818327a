//! Per-question answer tracking.
//!
//! The ledger owns one entry per question in the session's fixed order.
//! Re-answering overwrites; answers are never appended or deleted.
//! Question ids outside the session's order are rejected rather than
//! silently accepted, so a corrupt submission cannot be assembled.

use std::collections::HashMap;

use vigil_core::types::{AnswerEntry, OptionKey, QuestionId};

use crate::error::{Result, SessionError};

/// Answer state for one session.
pub struct AnswerLedger {
    entries: Vec<AnswerEntry>,
    index: HashMap<QuestionId, usize>,
}

impl AnswerLedger {
    /// Create a ledger with one unanswered entry per question.
    pub fn new(question_order: &[QuestionId]) -> Self {
        let entries: Vec<AnswerEntry> = question_order
            .iter()
            .map(|&q| AnswerEntry::unanswered(q))
            .collect();
        let index = question_order
            .iter()
            .enumerate()
            .map(|(i, &q)| (q, i))
            .collect();
        Self { entries, index }
    }

    fn entry_mut(&mut self, question_id: QuestionId) -> Result<&mut AnswerEntry> {
        let idx = *self
            .index
            .get(&question_id)
            .ok_or(SessionError::InvalidQuestion(question_id))?;
        Ok(&mut self.entries[idx])
    }

    /// Record (or overwrite) the selected option for a question.
    /// Repeated identical calls are idempotent.
    pub fn set_answer(&mut self, question_id: QuestionId, option: OptionKey) -> Result<()> {
        self.entry_mut(question_id)?.selected_option = Some(option);
        Ok(())
    }

    /// Toggle the review flag for a question; returns the new state.
    pub fn toggle_flag(&mut self, question_id: QuestionId) -> Result<bool> {
        let entry = self.entry_mut(question_id)?;
        entry.flagged_for_review = !entry.flagged_for_review;
        Ok(entry.flagged_for_review)
    }

    /// The currently selected option for a question, if any.
    pub fn answer(&self, question_id: QuestionId) -> Option<OptionKey> {
        self.index
            .get(&question_id)
            .and_then(|&i| self.entries[i].selected_option)
    }

    pub fn answered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.selected_option.is_some())
            .count()
    }

    pub fn total_questions(&self) -> usize {
        self.entries.len()
    }

    /// Fraction of questions answered, in `[0.0, 1.0]`.
    pub fn progress_fraction(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.entries.len() as f64
    }

    /// Entries the candidate touched (answered or flagged), in question
    /// order. Untouched questions are omitted from the snapshot.
    pub fn snapshot(&self) -> Vec<AnswerEntry> {
        self.entries
            .iter()
            .filter(|e| e.selected_option.is_some() || e.flagged_for_review)
            .cloned()
            .collect()
    }
}
