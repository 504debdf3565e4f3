use std::collections::HashMap;

use quiz_core::model::{Question, QuestionId};
use rand::Rng;
use rand::seq::SliceRandom;

/// Uniform random permutation of the catalog.
pub(crate) fn shuffled<R: Rng + ?Sized>(catalog: &[Question], rng: &mut R) -> Vec<Question> {
    let mut order = catalog.to_vec();
    order.shuffle(rng);
    order
}

/// Stored order mapped through the current catalog.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOrder {
    pub questions: Vec<Question>,
    /// Ids that no longer exist, with their position in the stored order.
    pub dropped: Vec<(usize, QuestionId)>,
}

impl ResolvedOrder {
    /// How many surviving questions sat before `position` in the stored order.
    pub fn kept_before(&self, position: usize) -> usize {
        let stored_len = self.questions.len() + self.dropped.len();
        let position = position.min(stored_len);
        let gone = self.dropped.iter().filter(|(at, _)| *at < position).count();
        position - gone
    }
}

/// Map stored ids through the current catalog, keeping stored order.
pub(crate) fn resolve_order(stored: &[QuestionId], catalog: &[Question]) -> ResolvedOrder {
    let by_id: HashMap<&QuestionId, &Question> =
        catalog.iter().map(|question| (&question.id, question)).collect();

    let mut questions = Vec::with_capacity(stored.len());
    let mut dropped = Vec::new();
    for (position, id) in stored.iter().enumerate() {
        match by_id.get(id) {
            Some(question) => questions.push((*question).clone()),
            None => dropped.push((position, id.clone())),
        }
    }
    ResolvedOrder { questions, dropped }
}
