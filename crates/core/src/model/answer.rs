use serde::{Deserialize, Serialize};

use crate::model::question::OptionKey;

/// Verdict returned by the catalog for one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCheck {
    pub correct: bool,
    pub correct_answer: OptionKey,
    pub topic: String,
    #[serde(alias = "question")]
    pub text: String,
}

/// What the user picked for a question, frozen the first time it is answered.
///
/// `legacy` marks a question that an older snapshot already credited without
/// keeping per-question history; such records never touch the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub selected_option: OptionKey,
    pub correct: bool,
    pub correct_answer: OptionKey,
    pub topic: String,
    #[serde(default)]
    pub legacy: bool,
}

impl AnswerRecord {
    #[must_use]
    pub fn from_check(selected_option: OptionKey, check: &AnswerCheck, legacy: bool) -> Self {
        Self {
            selected_option,
            correct: check.correct,
            correct_answer: check.correct_answer,
            topic: check.topic.clone(),
            legacy,
        }
    }
}

/// Per-topic tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStat {
    pub correct: u32,
    pub total: u32,
}

impl TopicStat {
    pub fn record(&mut self, correct: bool) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Whole-number percentage, rounded half away from zero. Zero when empty.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.correct, self.total)
    }
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
#[must_use]
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = u64::from(part) * 200 + u64::from(whole);
    let rounded = scaled / (u64::from(whole) * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_stat_counts_correct_and_total() {
        let mut stat = TopicStat::default();
        stat.record(true);
        stat.record(false);
        stat.record(true);
        assert_eq!(stat, TopicStat { correct: 2, total: 3 });
        assert_eq!(stat.percentage(), 67);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn record_without_legacy_field_defaults_to_false() {
        let raw = r#"{"selectedOption":"A","correct":true,"correctAnswer":"A","topic":"T"}"#;
        let record: AnswerRecord = serde_json::from_str(raw).unwrap();
        assert!(!record.legacy);
    }
}
