use quiz_core::model::{TopicStat, percentage};

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    /// Zero-based cursor, clamped to `total`.
    pub position: usize,
    pub total: usize,
    pub score: u32,
    pub answered: u32,
    pub percent_complete: u32,
}

/// Feedback band for the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Outstanding,
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl PerformanceTier {
    #[must_use]
    pub fn from_percentage(percent: u32) -> Self {
        match percent {
            90.. => Self::Outstanding,
            80..=89 => Self::Excellent,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            _ => Self::NeedsWork,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Outstanding => "Outstanding! You have mastered this material!",
            Self::Excellent => "Excellent work! You have a strong understanding!",
            Self::Good => "Good job! Keep reviewing to improve further.",
            Self::Fair => "Not bad, but there is room for improvement.",
            Self::NeedsWork => "Keep studying! Review the topics and try again.",
        }
    }
}

/// One row of the per-topic breakdown on the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicBreakdown {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl TopicBreakdown {
    pub(crate) fn new(topic: &str, stat: TopicStat) -> Self {
        Self {
            topic: topic.to_string(),
            correct: stat.correct,
            total: stat.total,
            percentage: stat.percentage(),
        }
    }
}

/// Final score summary. `percentage` is over the whole question order, so
/// legacy-credited questions without a recorded score count against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResults {
    pub score: u32,
    pub total: usize,
    pub percentage: u32,
    pub tier: PerformanceTier,
    pub topics: Vec<TopicBreakdown>,
}

impl QuizResults {
    pub(crate) fn new<'a>(
        score: u32,
        total: usize,
        topics: impl IntoIterator<Item = (&'a String, &'a TopicStat)>,
    ) -> Self {
        let whole = u32::try_from(total).unwrap_or(u32::MAX);
        let percentage = percentage(score, whole);
        Self {
            score,
            total,
            percentage,
            tier: PerformanceTier::from_percentage(percentage),
            topics: topics
                .into_iter()
                .map(|(topic, stat)| TopicBreakdown::new(topic, *stat))
                .collect(),
        }
    }
}
