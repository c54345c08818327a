//! Question bank — a reusable pool of vetted questions by topic.
//!
//! Stored as one JSON file; assessments draw fixed or random subsets
//! from it. Random assignment fails loudly when a topic cannot cover
//! the requested count instead of silently padding the assessment.

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use vigil_core::types::QuestionSpec;

use crate::error::{AssessError, Result};

/// A pool of questions employers draw from when building assessments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionBank {
    questions: Vec<QuestionSpec>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a bank from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Persist the bank to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Add questions to the pool.
    pub fn add_questions(&mut self, questions: impl IntoIterator<Item = QuestionSpec>) {
        self.questions.extend(questions);
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Distinct topics present in the bank, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.questions.iter().map(|q| q.topic.clone()).collect();
        topics.sort();
        topics.dedup();
        topics
    }

    /// All questions for one topic.
    pub fn questions_by_topic(&self, topic: &str) -> Vec<&QuestionSpec> {
        self.questions.iter().filter(|q| q.topic == topic).collect()
    }

    /// Draw `count` random questions from one topic.
    pub fn assign_random(&self, topic: &str, count: usize) -> Result<Vec<QuestionSpec>> {
        let pool = self.questions_by_topic(topic);
        if pool.len() < count {
            return Err(AssessError::InsufficientQuestions {
                topic: topic.to_string(),
                requested: count,
                available: pool.len(),
            });
        }

        let mut rng = rand::thread_rng();
        let selected: Vec<QuestionSpec> = pool
            .choose_multiple(&mut rng, count)
            .map(|q| (*q).clone())
            .collect();

        tracing::debug!(topic = %topic, count = selected.len(), "Random questions assigned");
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vigil_core::types::{Difficulty, OptionKey, QuestionId};

    fn question(topic: &str) -> QuestionSpec {
        let mut options = BTreeMap::new();
        options.insert(OptionKey::A, "first".to_string());
        options.insert(OptionKey::B, "second".to_string());
        options.insert(OptionKey::C, "third".to_string());
        options.insert(OptionKey::D, "fourth".to_string());
        QuestionSpec {
            question_id: QuestionId::new(),
            text: format!("A question about {topic}"),
            options,
            correct_answer: OptionKey::A,
            explanation: Some("Basics".to_string()),
            difficulty: Difficulty::Easy,
            topic: topic.to_string(),
        }
    }

    fn sample_bank() -> QuestionBank {
        let mut bank = QuestionBank::new();
        bank.add_questions([
            question("java"),
            question("java"),
            question("java"),
            question("sql"),
            question("sql"),
        ]);
        bank
    }

    #[test]
    fn topics_are_sorted_and_distinct() {
        let bank = sample_bank();
        assert_eq!(bank.topics(), vec!["java".to_string(), "sql".to_string()]);
        assert_eq!(bank.questions_by_topic("java").len(), 3);
        assert_eq!(bank.len(), 5);
    }

    #[test]
    fn random_assignment_respects_topic_and_count() {
        let bank = sample_bank();
        let drawn = bank.assign_random("java", 2).unwrap();
        assert_eq!(drawn.len(), 2);
        assert!(drawn.iter().all(|q| q.topic == "java"));

        // No duplicate draws.
        assert_ne!(drawn[0].question_id, drawn[1].question_id);
    }

    #[test]
    fn short_topic_pool_is_an_error() {
        let bank = sample_bank();
        let result = bank.assign_random("sql", 3);
        assert!(matches!(
            result,
            Err(AssessError::InsufficientQuestions {
                requested: 3,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn bank_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");

        let bank = sample_bank();
        bank.save(&path).unwrap();

        let loaded = QuestionBank::load(&path).unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.topics(), bank.topics());
    }
}
