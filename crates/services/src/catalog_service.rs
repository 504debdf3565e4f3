use std::collections::HashMap;

use async_trait::async_trait;
use quiz_core::model::{AnswerCheck, CatalogEntry, OptionKey, Question, QuestionId};

use crate::error::{BackendError, CatalogError};
use crate::remote::QuizBackend;

/// Immutable question bank with answer validation.
///
/// Built once at startup; the correct keys never leave this type except
/// inside an `AnswerCheck`.
#[derive(Debug, Clone)]
pub struct CatalogService {
    entries: Vec<CatalogEntry>,
    index: HashMap<QuestionId, usize>,
}

impl CatalogService {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            index.entry(entry.id.clone()).or_insert(position);
        }
        Self { entries, index }
    }

    /// Questions in bank order, without correct keys.
    #[must_use]
    pub fn list_public(&self) -> Vec<Question> {
        self.entries.iter().map(CatalogEntry::public).collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Check a submitted key against the stored one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::QuestionNotFound` for an unknown id; this is
    /// never reported as an incorrect answer.
    pub fn check_answer(
        &self,
        question_id: &QuestionId,
        answer: &str,
    ) -> Result<AnswerCheck, CatalogError> {
        let entry = self
            .index
            .get(question_id)
            .map(|position| &self.entries[*position])
            .ok_or_else(|| CatalogError::QuestionNotFound(question_id.clone()))?;

        Ok(AnswerCheck {
            correct: entry.is_correct(answer),
            correct_answer: entry.correct_answer,
            topic: entry.topic.clone(),
            text: entry.text.clone(),
        })
    }
}

#[async_trait]
impl QuizBackend for CatalogService {
    async fn list_questions(&self) -> Result<Vec<Question>, BackendError> {
        Ok(self.list_public())
    }

    async fn check_answer(
        &self,
        question_id: &QuestionId,
        answer: OptionKey,
    ) -> Result<AnswerCheck, BackendError> {
        Ok(CatalogService::check_answer(self, question_id, answer.as_str())?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    pub(crate) fn entry(id: &str, correct: OptionKey, topic: &str) -> CatalogEntry {
        CatalogEntry {
            id: QuestionId::new(id),
            text: format!("Question {id}"),
            options: OptionKey::ALL
                .into_iter()
                .map(|key| (key, format!("{id} option {key}")))
                .collect::<BTreeMap<_, _>>(),
            correct_answer: correct,
            topic: topic.to_string(),
        }
    }

    fn catalog() -> CatalogService {
        CatalogService::new(vec![
            entry("Q1", OptionKey::C, "Trees"),
            entry("Q2", OptionKey::A, "Losses"),
        ])
    }

    #[test]
    fn list_public_keeps_bank_order() {
        let ids: Vec<_> = catalog()
            .list_public()
            .into_iter()
            .map(|q| q.id.to_string())
            .collect();
        assert_eq!(ids, vec!["Q1", "Q2"]);
    }

    #[test]
    fn check_answer_reports_correctness_and_key() {
        let service = catalog();
        let right = service.check_answer(&QuestionId::new("Q1"), "C").unwrap();
        assert!(right.correct);
        assert_eq!(right.correct_answer, OptionKey::C);
        assert_eq!(right.topic, "Trees");

        let wrong = service.check_answer(&QuestionId::new("Q1"), "B").unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.correct_answer, OptionKey::C);
    }

    #[test]
    fn check_answer_does_not_normalize() {
        let service = catalog();
        assert!(!service.check_answer(&QuestionId::new("Q1"), "c").unwrap().correct);
    }

    #[test]
    fn unknown_question_is_distinct_error() {
        let err = catalog()
            .check_answer(&QuestionId::new("Q404"), "A")
            .unwrap_err();
        assert!(matches!(err, CatalogError::QuestionNotFound(id) if id == QuestionId::new("Q404")));
    }
}
