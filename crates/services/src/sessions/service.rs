use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::model::{
    AnswerCheck, AnswerRecord, Identity, OptionKey, Question, QuestionId, SessionSnapshot,
    TopicStat, percentage,
};
use rand::Rng;
use tracing::debug;

use super::order::{resolve_order, shuffled};
use super::progress::{QuizProgress, QuizResults};
use crate::error::SessionError;

/// Answered count at which an anonymous user is asked to sign up.
pub const SIGNUP_PROMPT_AT: u32 = 5;
/// Answered count from which the donation prompt stays visible.
pub const DONATION_PROMPT_AT: u32 = 10;

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Coarse lifecycle of a quiz as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    /// A saved remote snapshot was found and the user must choose.
    Reconciling,
    Active,
    Complete,
}

/// Navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Back,
}

/// What the cursor is pointing at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentQuestion<'a> {
    /// Not answered yet; options are selectable.
    Fresh { index: usize, question: &'a Question },
    /// Answered before; shown read-only with the stored result.
    Review {
        index: usize,
        question: &'a Question,
        record: &'a AnswerRecord,
    },
    /// Credited by an older snapshot without a stored answer.
    LegacySkip { index: usize, question: &'a Question },
    Exhausted,
}

impl<'a> CurrentQuestion<'a> {
    #[must_use]
    pub fn question(&self) -> Option<&'a Question> {
        match *self {
            Self::Fresh { question, .. }
            | Self::Review { question, .. }
            | Self::LegacySkip { question, .. } => Some(question),
            Self::Exhausted => None,
        }
    }

    /// Whether `next` is allowed without answering first.
    #[must_use]
    pub fn can_skip(&self) -> bool {
        matches!(self, Self::Review { .. } | Self::LegacySkip { .. })
    }
}

/// Prompts triggered by a single answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptEvents {
    pub signup: bool,
    pub donation: bool,
}

/// Result of recording an answer; `snapshot` is what should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub record: AnswerRecord,
    pub prompts: PromptEvents,
    pub snapshot: SessionSnapshot,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's pass through the question catalog.
///
/// Owns the shuffled order, the counters and the per-question answer history.
/// All mutation goes through `&mut self`; persistence and answer checking are
/// the caller's job (see `QuizLoopService`).
#[derive(Debug, Clone)]
pub struct QuizSession {
    catalog: Arc<[Question]>,
    order: Vec<Question>,
    current: usize,
    score: u32,
    answered: u32,
    topic_stats: BTreeMap<String, TopicStat>,
    history: BTreeMap<QuestionId, AnswerRecord>,
    legacy_threshold: usize,
    identity: Option<Identity>,
    signup_prompt_fired: bool,
}

impl QuizSession {
    /// Fresh session over a random permutation of `catalog`.
    pub fn start<R: Rng + ?Sized>(catalog: Arc<[Question]>, rng: &mut R) -> Self {
        let order = shuffled(&catalog, rng);
        Self {
            catalog,
            order,
            current: 0,
            score: 0,
            answered: 0,
            topic_stats: BTreeMap::new(),
            history: BTreeMap::new(),
            legacy_threshold: 0,
            identity: None,
            signup_prompt_fired: false,
        }
    }

    /// Rebuild a session from a stored snapshot.
    ///
    /// Ids missing from `catalog` are dropped. The cursor and the legacy
    /// prefix are mapped onto the surviving order, and answers given to
    /// dropped questions are taken back out of the counters so that
    /// `score <= answered <= order.len()` holds again.
    #[must_use]
    pub fn resume(snapshot: &SessionSnapshot, catalog: Arc<[Question]>) -> Self {
        let resolved = resolve_order(&snapshot.question_order, &catalog);
        let stored_answered = usize::try_from(snapshot.answered).unwrap_or(usize::MAX);
        let current = resolved.kept_before(snapshot.current_question_index);
        let legacy_threshold = resolved.kept_before(stored_answered);

        let mut session = Self {
            catalog,
            order: resolved.questions,
            current,
            score: snapshot.score,
            answered: snapshot.answered,
            topic_stats: snapshot.topic_stats.clone(),
            history: snapshot.answer_history.clone(),
            legacy_threshold,
            identity: None,
            signup_prompt_fired: false,
        };
        if !resolved.dropped.is_empty() {
            debug!(
                dropped = resolved.dropped.len(),
                cursor = current,
                "snapshot referenced unknown questions"
            );
            session.forget_dropped(&resolved.dropped, stored_answered);
            session.settle_counters();
        }
        session
    }

    /// Uncount answers that belonged to questions no longer in the catalog.
    ///
    /// A stored record says exactly what to take back. A legacy-credited
    /// position without one only tells us it was answered; its topic and
    /// result are trimmed later by `settle_counters`.
    fn forget_dropped(&mut self, dropped: &[(usize, QuestionId)], stored_answered: usize) {
        for (position, id) in dropped {
            match self.history.remove(id) {
                Some(record) if !record.legacy => {
                    self.answered = self.answered.saturating_sub(1);
                    if record.correct {
                        self.score = self.score.saturating_sub(1);
                    }
                    if let Some(stat) = self.topic_stats.get_mut(&record.topic) {
                        stat.total = stat.total.saturating_sub(1);
                        if record.correct {
                            stat.correct = stat.correct.saturating_sub(1);
                        }
                    }
                }
                _ if *position < stored_answered => {
                    self.answered = self.answered.saturating_sub(1);
                }
                _ => {}
            }
        }
    }

    /// Clamp counters to the order and bring topic totals down to `answered`.
    fn settle_counters(&mut self) {
        let len = u32::try_from(self.order.len()).unwrap_or(u32::MAX);
        self.answered = self.answered.min(len);

        let mut excess = self
            .topic_stats
            .values()
            .map(|stat| stat.total)
            .sum::<u32>()
            .saturating_sub(self.answered);
        if excess > 0 {
            for stat in self.topic_stats.values_mut() {
                let cut = excess.min(stat.total);
                stat.total -= cut;
                stat.correct = stat.correct.min(stat.total);
                excess -= cut;
                if excess == 0 {
                    break;
                }
            }
            let correct: u32 = self.topic_stats.values().map(|stat| stat.correct).sum();
            self.score = self.score.min(correct);
        }
        self.topic_stats.retain(|_, stat| stat.total > 0);
        self.score = self.score.min(self.answered);
        self.current = self.current.min(self.order.len());
        self.legacy_threshold = self.legacy_threshold.min(self.order.len());
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<[Question]> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn order(&self) -> &[Question] {
        &self.order
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn topic_stats(&self) -> &BTreeMap<String, TopicStat> {
        &self.topic_stats
    }

    #[must_use]
    pub fn history(&self) -> &BTreeMap<QuestionId, AnswerRecord> {
        &self.history
    }

    #[must_use]
    pub fn legacy_threshold(&self) -> usize {
        self.legacy_threshold
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn bind_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn unbind_identity(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    #[must_use]
    pub fn signup_prompt_fired(&self) -> bool {
        self.signup_prompt_fired
    }

    /// Suppress the signup prompt for the rest of this session.
    pub fn mark_signup_prompted(&mut self) {
        self.signup_prompt_fired = true;
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.order.len()
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.is_complete() {
            QuizPhase::Complete
        } else {
            QuizPhase::Active
        }
    }

    #[must_use]
    pub fn current(&self) -> CurrentQuestion<'_> {
        let index = self.current;
        let Some(question) = self.order.get(index) else {
            return CurrentQuestion::Exhausted;
        };
        if let Some(record) = self.history.get(&question.id) {
            CurrentQuestion::Review {
                index,
                question,
                record,
            }
        } else if index < self.legacy_threshold {
            CurrentQuestion::LegacySkip { index, question }
        } else {
            CurrentQuestion::Fresh { index, question }
        }
    }

    /// The current question, if it can still take an answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` past the end and
    /// `SessionError::AlreadyAnswered` when a record already exists.
    pub fn ensure_answerable(&self) -> Result<&Question, SessionError> {
        match self.current() {
            CurrentQuestion::Exhausted => Err(SessionError::Completed),
            CurrentQuestion::Review { .. } => Err(SessionError::AlreadyAnswered),
            CurrentQuestion::Fresh { question, .. }
            | CurrentQuestion::LegacySkip { question, .. } => Ok(question),
        }
    }

    /// Apply a checked answer to the current question.
    ///
    /// Legacy-credited questions get a `legacy` record and leave every
    /// counter untouched.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::ensure_answerable`]; state is unchanged on error.
    pub fn record_answer(
        &mut self,
        selected: OptionKey,
        check: &AnswerCheck,
    ) -> Result<AnswerOutcome, SessionError> {
        let question_id = self.ensure_answerable()?.id.clone();
        let legacy = self.current < self.legacy_threshold;
        let record = AnswerRecord::from_check(selected, check, legacy);

        let mut prompts = PromptEvents::default();
        if !legacy {
            self.answered = self.answered.saturating_add(1);
            if check.correct {
                self.score = self.score.saturating_add(1);
            }
            self.topic_stats
                .entry(check.topic.clone())
                .or_default()
                .record(check.correct);

            if self.answered == SIGNUP_PROMPT_AT
                && self.identity.is_none()
                && !self.signup_prompt_fired
            {
                self.signup_prompt_fired = true;
                prompts.signup = true;
            }
        }
        prompts.donation = self.donation_prompt_visible();

        self.history.insert(question_id, record.clone());
        Ok(AnswerOutcome {
            record,
            prompts,
            snapshot: self.snapshot(),
        })
    }

    /// Move the cursor; returns the new index. Saturates at both ends.
    pub fn advance(&mut self, direction: Direction) -> usize {
        self.current = match direction {
            Direction::Next => (self.current + 1).min(self.order.len()),
            Direction::Back => self.current.saturating_sub(1),
        };
        self.current
    }

    /// Reshuffle the whole catalog and clear all progress. The bound identity
    /// and the signup latch survive.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order = shuffled(&self.catalog, rng);
        self.current = 0;
        self.score = 0;
        self.answered = 0;
        self.topic_stats.clear();
        self.history.clear();
        self.legacy_threshold = 0;
    }

    #[must_use]
    pub fn donation_prompt_visible(&self) -> bool {
        self.answered >= DONATION_PROMPT_AT
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            question_order: self.order.iter().map(|q| q.id.clone()).collect(),
            current_question_index: self.current,
            score: self.score,
            answered: self.answered,
            topic_stats: self.topic_stats.clone(),
            answer_history: self.history.clone(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.order.len();
        let position = self.current.min(total);
        QuizProgress {
            position,
            total,
            score: self.score,
            answered: self.answered,
            percent_complete: percentage(
                u32::try_from(position).unwrap_or(u32::MAX),
                u32::try_from(total).unwrap_or(u32::MAX),
            ),
        }
    }

    #[must_use]
    pub fn results(&self) -> QuizResults {
        QuizResults::new(self.score, self.order.len(), &self.topic_stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::tests::{check_for, question_bank};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog(n: usize) -> Arc<[Question]> {
        question_bank(n).into()
    }

    fn answer(session: &mut QuizSession, choice: OptionKey) -> AnswerOutcome {
        let question = session.ensure_answerable().unwrap().clone();
        let check = check_for(&question, choice);
        session.record_answer(choice, &check).unwrap()
    }

    #[test]
    fn start_shuffles_full_catalog_with_zeroed_counters() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = QuizSession::start(catalog(20), &mut rng);

        assert_eq!(session.order().len(), 20);
        assert_eq!(session.current_index(), 0);
        assert_eq!((session.score(), session.answered()), (0, 0));
        assert!(session.topic_stats().is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.phase(), QuizPhase::Active);
    }

    #[test]
    fn empty_catalog_starts_complete() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = QuizSession::start(catalog(0), &mut rng);
        assert_eq!(session.phase(), QuizPhase::Complete);
        assert_eq!(session.current(), CurrentQuestion::Exhausted);
    }

    #[test]
    fn answer_then_back_shows_review_and_blocks_resubmit() {
        let snapshot = SessionSnapshot {
            question_order: ["Q1", "Q2", "Q3"].map(QuestionId::new).to_vec(),
            ..SessionSnapshot::default()
        };
        let mut session = QuizSession::resume(&snapshot, catalog(3));

        // Q1 correct (bank key is A), Q2 wrong.
        let first = answer(&mut session, OptionKey::A);
        assert!(first.record.correct);
        session.advance(Direction::Next);
        let second = answer(&mut session, OptionKey::D);
        assert!(!second.record.correct);
        session.advance(Direction::Back);

        match session.current() {
            CurrentQuestion::Review { question, record, .. } => {
                assert_eq!(question.id, QuestionId::new("Q1"));
                assert_eq!(record.selected_option, OptionKey::A);
                assert!(record.correct);
            }
            other => panic!("expected review, got {other:?}"),
        }
        assert!(matches!(
            session.record_answer(OptionKey::B, &check_for(&session.order()[0], OptionKey::B)),
            Err(SessionError::AlreadyAnswered)
        ));
        assert_eq!((session.score(), session.answered()), (1, 2));
    }

    #[test]
    fn legacy_snapshot_marks_leading_questions() {
        let bank = catalog(20);
        let snapshot = SessionSnapshot {
            question_order: bank.iter().map(|q| q.id.clone()).collect(),
            current_question_index: 5,
            score: 3,
            answered: 5,
            topic_stats: BTreeMap::from([("Trees".to_string(), TopicStat { correct: 3, total: 5 })]),
            answer_history: BTreeMap::new(),
        };
        let mut session = QuizSession::resume(&snapshot, bank);
        assert_eq!(session.legacy_threshold(), 5);

        for _ in 0..5 {
            session.advance(Direction::Back);
        }
        assert!(matches!(session.current(), CurrentQuestion::LegacySkip { index: 0, .. }));
        assert!(session.current().can_skip());

        let outcome = answer(&mut session, OptionKey::A);
        assert!(outcome.record.legacy);
        assert_eq!((session.score(), session.answered()), (3, 5));
        assert_eq!(session.topic_stats()["Trees"].total, 5);
        assert!(matches!(session.current(), CurrentQuestion::Review { .. }));

        for _ in 0..5 {
            session.advance(Direction::Next);
        }
        assert!(matches!(session.current(), CurrentQuestion::Fresh { index: 5, .. }));
    }

    #[test]
    fn resume_drops_unknown_ids_and_clamps_threshold() {
        let snapshot = SessionSnapshot {
            question_order: ["Q2", "OLD", "Q1"].map(QuestionId::new).to_vec(),
            current_question_index: 1,
            score: 2,
            answered: 3,
            topic_stats: BTreeMap::from([("Trees".to_string(), TopicStat { correct: 2, total: 3 })]),
            answer_history: BTreeMap::new(),
        };
        let session = QuizSession::resume(&snapshot, catalog(3));
        assert_eq!(session.order().len(), 2);
        assert_eq!(session.legacy_threshold(), 2);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.answered(), 2);
        assert!(session.score() <= session.answered());
        session.snapshot().check_consistency().unwrap();
    }

    #[test]
    fn resume_maps_cursor_past_dropped_ids() {
        let snapshot = SessionSnapshot {
            question_order: ["OLD1", "OLD2", "Q1", "Q2", "Q3"].map(QuestionId::new).to_vec(),
            current_question_index: 4,
            score: 3,
            answered: 4,
            topic_stats: BTreeMap::from([
                ("Losses".to_string(), TopicStat { correct: 1, total: 2 }),
                ("Trees".to_string(), TopicStat { correct: 2, total: 2 }),
            ]),
            answer_history: BTreeMap::new(),
        };
        let mut session = QuizSession::resume(&snapshot, catalog(3));

        assert_eq!(session.phase(), QuizPhase::Active);
        assert!(matches!(session.current(), CurrentQuestion::Fresh { index: 2, .. }));
        assert_eq!(session.legacy_threshold(), 2);
        assert_eq!(session.answered(), 2);
        session.snapshot().check_consistency().unwrap();

        let outcome = answer(&mut session, OptionKey::A);
        assert!(!outcome.record.legacy);
        assert_eq!(session.answered(), 3);
        outcome.snapshot.check_consistency().unwrap();
    }

    #[test]
    fn resume_uncounts_recorded_answers_to_dropped_ids() {
        let record = |correct: bool, topic: &str| AnswerRecord {
            selected_option: OptionKey::A,
            correct,
            correct_answer: OptionKey::A,
            topic: topic.to_string(),
            legacy: false,
        };
        let snapshot = SessionSnapshot {
            question_order: ["Q1", "OLD", "Q2"].map(QuestionId::new).to_vec(),
            current_question_index: 2,
            score: 2,
            answered: 2,
            topic_stats: BTreeMap::from([
                ("Metrics".to_string(), TopicStat { correct: 1, total: 1 }),
                ("Trees".to_string(), TopicStat { correct: 1, total: 1 }),
            ]),
            answer_history: BTreeMap::from([
                (QuestionId::new("Q1"), record(true, "Trees")),
                (QuestionId::new("OLD"), record(true, "Metrics")),
            ]),
        };
        let session = QuizSession::resume(&snapshot, catalog(3));

        assert_eq!((session.score(), session.answered()), (1, 1));
        assert_eq!(session.current_index(), 1);
        assert!(!session.history().contains_key(&QuestionId::new("OLD")));
        assert!(!session.topic_stats().contains_key("Metrics"));
        assert!(matches!(session.current(), CurrentQuestion::Fresh { index: 1, .. }));
    }

    #[test]
    fn resume_past_end_is_complete() {
        let snapshot = SessionSnapshot {
            question_order: ["Q1"].map(QuestionId::new).to_vec(),
            current_question_index: 4,
            ..SessionSnapshot::default()
        };
        let session = QuizSession::resume(&snapshot, catalog(1));
        assert_eq!(session.phase(), QuizPhase::Complete);
        assert_eq!(session.progress().position, 1);
    }

    #[test]
    fn signup_prompt_fires_once_on_fifth_answer() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = QuizSession::start(catalog(12), &mut rng);

        let mut fired = Vec::new();
        for _ in 0..12 {
            let outcome = answer(&mut session, OptionKey::B);
            fired.push(outcome.prompts.signup);
            session.advance(Direction::Next);
        }
        let fired_at: Vec<_> = fired
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i + 1))
            .collect();
        assert_eq!(fired_at, vec![5]);

        session.restart(&mut rng);
        for _ in 0..5 {
            let outcome = answer(&mut session, OptionKey::B);
            assert!(!outcome.prompts.signup);
            session.advance(Direction::Next);
        }
    }

    #[test]
    fn signup_prompt_suppressed_when_identity_bound_or_resumed_past() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = QuizSession::start(catalog(6), &mut rng);
        session.bind_identity(Identity::parse("a@b.io").unwrap());
        for _ in 0..6 {
            assert!(!answer(&mut session, OptionKey::A).prompts.signup);
            session.advance(Direction::Next);
        }

        let bank = catalog(10);
        let snapshot = SessionSnapshot {
            question_order: bank.iter().map(|q| q.id.clone()).collect(),
            current_question_index: 7,
            score: 7,
            answered: 7,
            topic_stats: BTreeMap::from([("Trees".to_string(), TopicStat { correct: 7, total: 7 })]),
            answer_history: BTreeMap::new(),
        };
        let mut resumed = QuizSession::resume(&snapshot, bank);
        assert!(!answer(&mut resumed, OptionKey::A).prompts.signup);
    }

    #[test]
    fn donation_prompt_visible_from_tenth_answer() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = QuizSession::start(catalog(11), &mut rng);
        for n in 1..=11 {
            let outcome = answer(&mut session, OptionKey::C);
            assert_eq!(outcome.prompts.donation, n >= 10);
            session.advance(Direction::Next);
        }
        assert!(session.donation_prompt_visible());
    }

    #[test]
    fn advance_saturates_at_both_ends() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = QuizSession::start(catalog(2), &mut rng);
        assert_eq!(session.advance(Direction::Back), 0);
        assert_eq!(session.advance(Direction::Next), 1);
        assert_eq!(session.advance(Direction::Next), 2);
        assert_eq!(session.advance(Direction::Next), 2);
        assert!(matches!(session.ensure_answerable(), Err(SessionError::Completed)));
    }

    #[test]
    fn restart_resets_everything_but_identity() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = QuizSession::start(catalog(4), &mut rng);
        session.bind_identity(Identity::parse("a@b.io").unwrap());
        answer(&mut session, OptionKey::A);
        session.advance(Direction::Next);

        session.restart(&mut rng);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.question_order.len(), 4);
        assert_eq!(snapshot.current_question_index, 0);
        assert_eq!((snapshot.score, snapshot.answered), (0, 0));
        assert!(snapshot.answer_history.is_empty());
        assert!(snapshot.topic_stats.is_empty());
        assert!(session.identity().is_some());
    }

    #[test]
    fn snapshot_satisfies_counter_invariants() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = QuizSession::start(catalog(8), &mut rng);
        for choice in [OptionKey::A, OptionKey::B, OptionKey::A, OptionKey::D] {
            let outcome = answer(&mut session, choice);
            outcome.snapshot.check_consistency().unwrap();
            session.advance(Direction::Next);
        }
        let results = session.results();
        assert_eq!(results.total, 8);
        assert_eq!(results.score, session.score());
    }
}
