use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionKeyError {
    #[error("invalid option key: {0:?}")]
    Invalid(String),
}

//
// ─── OPTION KEY ───────────────────────────────────────────────────────────────
//

/// One of the four answer slots of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = OptionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            other => Err(OptionKeyError::Invalid(other.to_string())),
        }
    }
}

impl TryFrom<String> for OptionKey {
    type Error = OptionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OptionKey> for String {
    fn from(value: OptionKey) -> Self {
        value.as_str().to_string()
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A question as shipped to clients: never carries the correct key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(alias = "question")]
    pub text: String,
    pub options: BTreeMap<OptionKey, String>,
    pub topic: String,
}

impl Question {
    #[must_use]
    pub fn option_text(&self, key: OptionKey) -> Option<&str> {
        self.options.get(&key).map(String::as_str)
    }
}

/// A question bank row as held by the server, including its correct key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: QuestionId,
    #[serde(alias = "question")]
    pub text: String,
    pub options: BTreeMap<OptionKey, String>,
    pub correct_answer: OptionKey,
    pub topic: String,
}

impl CatalogEntry {
    /// Strip the correct key for the listing endpoint.
    #[must_use]
    pub fn public(&self) -> Question {
        Question {
            id: self.id.clone(),
            text: self.text.clone(),
            options: self.options.clone(),
            topic: self.topic.clone(),
        }
    }

    /// Exact comparison against the stored key. `"a"` is not `"A"`.
    #[must_use]
    pub fn is_correct(&self, submitted: &str) -> bool {
        submitted == self.correct_answer.as_str()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: QuestionId::new("Q1"),
            text: "Which loss suits binary classification?".into(),
            options: BTreeMap::from([
                (OptionKey::A, "MSE".into()),
                (OptionKey::B, "Hinge".into()),
                (OptionKey::C, "Cross-entropy".into()),
                (OptionKey::D, "MAE".into()),
            ]),
            correct_answer: OptionKey::C,
            topic: "Losses".into(),
        }
    }

    #[test]
    fn option_key_parse_is_case_sensitive() {
        assert_eq!("B".parse::<OptionKey>().unwrap(), OptionKey::B);
        assert!(matches!(
            "b".parse::<OptionKey>(),
            Err(OptionKeyError::Invalid(_))
        ));
    }

    #[test]
    fn is_correct_uses_exact_match() {
        let entry = entry();
        assert!(entry.is_correct("C"));
        assert!(!entry.is_correct("c"));
        assert!(!entry.is_correct(" C"));
        assert!(!entry.is_correct("A"));
    }

    #[test]
    fn public_question_omits_correct_key() {
        let json = serde_json::to_value(entry().public()).unwrap();
        assert!(json.get("correctAnswer").is_none());
        assert_eq!(json["options"]["C"], "Cross-entropy");
        assert_eq!(json["text"], "Which loss suits binary classification?");
    }

    #[test]
    fn question_accepts_legacy_text_field() {
        let raw = r#"{"id":"Q2","question":"Pick one","options":{"A":"x","B":"y","C":"z","D":"w"},"topic":"T"}"#;
        let question: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(question.text, "Pick one");
        assert_eq!(question.option_text(OptionKey::D), Some("w"));
    }
}
