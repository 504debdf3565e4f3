use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::answer::{AnswerRecord, TopicStat};
use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("score ({score}) exceeds answered ({answered})")]
    ScoreExceedsAnswered { score: u32, answered: u32 },

    #[error("answered ({answered}) exceeds question count ({questions})")]
    AnsweredExceedsOrder { answered: u32, questions: usize },

    #[error("answered ({answered}) does not match topic totals ({sum})")]
    TopicTotalsMismatch { answered: u32, sum: u64 },
}

/// Serializable state of one quiz session, the unit of persistence.
///
/// Snapshots written before per-question history existed have no
/// `answerHistory` field; they load with an empty map and their first
/// `answered` questions are treated as legacy-answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub question_order: Vec<QuestionId>,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub answered: u32,
    #[serde(default)]
    pub topic_stats: BTreeMap<String, TopicStat>,
    #[serde(default)]
    pub answer_history: BTreeMap<QuestionId, AnswerRecord>,
}

impl SessionSnapshot {
    /// Number of leading questions credited by `answered` alone:
    /// `clamp(answered, 0, question_order.len())`.
    #[must_use]
    pub fn legacy_threshold(&self) -> usize {
        usize::try_from(self.answered)
            .unwrap_or(usize::MAX)
            .min(self.question_order.len())
    }

    /// Verify the counter invariants.
    ///
    /// # Errors
    ///
    /// Returns the first `SnapshotError` found.
    pub fn check_consistency(&self) -> Result<(), SnapshotError> {
        if self.score > self.answered {
            return Err(SnapshotError::ScoreExceedsAnswered {
                score: self.score,
                answered: self.answered,
            });
        }
        let answered = usize::try_from(self.answered).unwrap_or(usize::MAX);
        if answered > self.question_order.len() {
            return Err(SnapshotError::AnsweredExceedsOrder {
                answered: self.answered,
                questions: self.question_order.len(),
            });
        }
        let sum: u64 = self
            .topic_stats
            .values()
            .map(|stat| u64::from(stat.total))
            .sum();
        if sum != u64::from(self.answered) {
            return Err(SnapshotError::TopicTotalsMismatch {
                answered: self.answered,
                sum,
            });
        }
        Ok(())
    }
}
