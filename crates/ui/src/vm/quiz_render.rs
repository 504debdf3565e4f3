use quiz_core::model::{AnswerRecord, OptionKey, Question};
use services::{CurrentQuestion, QuizPhase, QuizProgress, QuizResults, RemoteSave, SaveReport};
use url::Url;

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";
const LEGACY_NOTE: &str = "This question was already counted, so your score is unchanged.";

/// How a single option button is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionState {
    /// Selectable.
    Open,
    Correct,
    /// The learner's wrong pick.
    Incorrect,
    Muted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionRow {
    pub key: OptionKey,
    pub label: String,
    pub state: OptionState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardMode {
    Fresh,
    Review {
        correct: bool,
        correct_answer: OptionKey,
        /// Re-answered after older progress already counted it.
        legacy: bool,
    },
    /// Credited by older saved progress without a stored answer.
    LegacySkip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionCard {
    pub id: String,
    /// 1-based position in the order.
    pub number: usize,
    pub text: String,
    pub topic: String,
    pub options: Vec<OptionRow>,
    pub mode: CardMode,
}

impl QuestionCard {
    #[must_use]
    pub fn from_current(current: CurrentQuestion<'_>) -> Option<Self> {
        match current {
            CurrentQuestion::Exhausted => None,
            CurrentQuestion::Fresh { index, question } => {
                Some(Self::build(index, question, CardMode::Fresh, |_| OptionState::Open))
            }
            CurrentQuestion::LegacySkip { index, question } => Some(Self::build(
                index,
                question,
                CardMode::LegacySkip,
                |_| OptionState::Open,
            )),
            CurrentQuestion::Review {
                index,
                question,
                record,
            } => {
                let mode = CardMode::Review {
                    correct: record.correct,
                    correct_answer: record.correct_answer,
                    legacy: record.legacy,
                };
                Some(Self::build(index, question, mode, |key| {
                    review_state(key, record)
                }))
            }
        }
    }

    fn build(
        index: usize,
        question: &Question,
        mode: CardMode,
        state_for: impl Fn(OptionKey) -> OptionState,
    ) -> Self {
        Self {
            id: question.id.as_str().to_string(),
            number: index + 1,
            text: question.text.clone(),
            topic: question.topic.clone(),
            options: question
                .options
                .iter()
                .map(|(key, label)| OptionRow {
                    key: *key,
                    label: label.clone(),
                    state: state_for(*key),
                })
                .collect(),
            mode,
        }
    }

    #[must_use]
    pub fn is_answerable(&self) -> bool {
        !matches!(self.mode, CardMode::Review { .. })
    }

    #[must_use]
    pub fn feedback(&self) -> Option<String> {
        let (verdict, legacy) = match self.mode {
            CardMode::Fresh => return None,
            CardMode::LegacySkip => {
                return Some(
                    "Already counted from your earlier progress. Answer again or skip ahead."
                        .to_string(),
                );
            }
            CardMode::Review {
                correct: true,
                legacy,
                ..
            } => ("Correct!".to_string(), legacy),
            CardMode::Review {
                correct: false,
                correct_answer,
                legacy,
            } => (
                format!("Incorrect. The correct answer is {correct_answer}."),
                legacy,
            ),
        };
        Some(if legacy {
            format!("{verdict} {LEGACY_NOTE}")
        } else {
            verdict
        })
    }

    /// Web search for the topic and question, offered after a wrong answer.
    #[must_use]
    pub fn search_url(&self) -> Option<String> {
        if !matches!(self.mode, CardMode::Review { correct: false, .. }) {
            return None;
        }
        let query = format!("{} {}", self.topic, self.text);
        Url::parse_with_params(SEARCH_ENDPOINT, &[("q", query.as_str())])
            .ok()
            .map(String::from)
    }
}

fn review_state(key: OptionKey, record: &AnswerRecord) -> OptionState {
    if key == record.correct_answer {
        OptionState::Correct
    } else if key == record.selected_option {
        OptionState::Incorrect
    } else {
        OptionState::Muted
    }
}

/// Saved progress found for an identity, waiting for a resume/discard choice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumePrompt {
    pub identity: String,
    pub answered: u32,
    pub total: usize,
}

/// Non-blocking status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    RemoteUnavailable,
    RemoteSaveFailed,
    LocalSaveFailed,
    NoSavedProgress,
    ProgressReset,
    SignedOut,
}

impl Notice {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::RemoteUnavailable => {
                "Saved progress could not be loaded. Continuing with this device's progress."
            }
            Self::RemoteSaveFailed => {
                "Progress saved on this device only. It will sync on your next answer."
            }
            Self::LocalSaveFailed => "Progress could not be saved on this device.",
            Self::NoSavedProgress => "No saved progress found. Your current progress is now saved.",
            Self::ProgressReset => "Your saved progress has been erased.",
            Self::SignedOut => "Signed out. Progress stays on this device.",
        }
    }

    #[must_use]
    pub fn for_save(save: &SaveReport) -> Option<Self> {
        if matches!(save.remote, RemoteSave::Failed(_)) {
            Some(Self::RemoteSaveFailed)
        } else if save.local_saved {
            None
        } else {
            Some(Self::LocalSaveFailed)
        }
    }
}

/// Everything the quiz screen needs to draw itself.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizRender {
    pub phase: QuizPhase,
    pub progress: Option<QuizProgress>,
    pub card: Option<QuestionCard>,
    pub results: Option<QuizResults>,
    pub resume: Option<ResumePrompt>,
    pub identity: Option<String>,
    pub signup_prompt: bool,
    pub donation_prompt: bool,
    pub notice: Option<Notice>,
    pub can_back: bool,
    pub can_next: bool,
}

impl QuizRender {
    #[must_use]
    pub fn loading() -> Self {
        Self {
            phase: QuizPhase::Loading,
            progress: None,
            card: None,
            results: None,
            resume: None,
            identity: None,
            signup_prompt: false,
            donation_prompt: false,
            notice: None,
            can_back: false,
            can_next: false,
        }
    }

    #[must_use]
    pub fn progress_label(&self) -> String {
        self.progress.map_or_else(String::new, |progress| {
            let shown = (progress.position + 1).min(progress.total);
            format!("Question {shown} of {}", progress.total)
        })
    }

    #[must_use]
    pub fn score_label(&self) -> String {
        self.progress.map_or_else(String::new, |progress| {
            format!("Score: {}/{}", progress.score, progress.answered)
        })
    }
}
