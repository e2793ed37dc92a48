use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::ids::QuestionId;

/// Selected options per question plus the questions flagged for review.
///
/// Every operation is total: unknown ids simply create or remove entries.
/// Answers and marks are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: HashMap<QuestionId, String>,
    marked: HashSet<QuestionId>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted answers and marks.
    #[must_use]
    pub fn from_parts(
        answers: impl IntoIterator<Item = (QuestionId, String)>,
        marked: impl IntoIterator<Item = QuestionId>,
    ) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            marked: marked.into_iter().collect(),
        }
    }

    /// Record `option` for `id`, replacing any earlier answer.
    pub fn set(&mut self, id: QuestionId, option: impl Into<String>) {
        self.answers.insert(id, option.into());
    }

    /// Forget the answer for `id`; returns the removed option, if any.
    pub fn unset(&mut self, id: QuestionId) -> Option<String> {
        self.answers.remove(&id)
    }

    #[must_use]
    pub fn answer(&self, id: QuestionId) -> Option<&str> {
        self.answers.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.answers.contains_key(&id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Flip the review flag for `id`; returns true when the question is now marked.
    pub fn toggle_mark(&mut self, id: QuestionId) -> bool {
        if self.marked.remove(&id) {
            false
        } else {
            self.marked.insert(id);
            true
        }
    }

    #[must_use]
    pub fn is_marked(&self, id: QuestionId) -> bool {
        self.marked.contains(&id)
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Answers ordered by question id.
    #[must_use]
    pub fn answers_sorted(&self) -> BTreeMap<QuestionId, String> {
        self.answers
            .iter()
            .map(|(id, option)| (*id, option.clone()))
            .collect()
    }

    /// Marked ids in ascending order.
    #[must_use]
    pub fn marked_sorted(&self) -> Vec<QuestionId> {
        let mut ids: Vec<_> = self.marked.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drop answers and marks that do not satisfy `keep`.
    pub fn retain_questions(&mut self, mut keep: impl FnMut(QuestionId) -> bool) {
        self.answers.retain(|id, _| keep(*id));
        self.marked.retain(|id| keep(*id));
    }

    pub fn clear(&mut self) {
        self.answers.clear();
        self.marked.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.marked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_answer_wins() {
        let mut store = AnswerStore::new();
        store.set(QuestionId::new(1), "A");
        store.set(QuestionId::new(1), "B");
        assert_eq!(store.answer(QuestionId::new(1)), Some("B"));
        assert_eq!(store.answered_count(), 1);
    }

    #[test]
    fn toggling_twice_restores_marks() {
        let mut store = AnswerStore::new();
        store.toggle_mark(QuestionId::new(5));
        let before = store.clone();

        assert!(store.toggle_mark(QuestionId::new(2)));
        assert!(!store.toggle_mark(QuestionId::new(2)));
        assert_eq!(store, before);
    }

    #[test]
    fn marks_are_independent_of_answers() {
        let mut store = AnswerStore::new();
        store.toggle_mark(QuestionId::new(3));
        assert!(store.is_marked(QuestionId::new(3)));
        assert!(!store.is_answered(QuestionId::new(3)));

        store.set(QuestionId::new(3), "C");
        assert_eq!(store.unset(QuestionId::new(3)), Some("C".into()));
        assert!(store.is_marked(QuestionId::new(3)));
        assert_eq!(store.unset(QuestionId::new(99)), None);
    }

    #[test]
    fn sorted_views_are_ordered() {
        let store = AnswerStore::from_parts(
            [(QuestionId::new(3), "C".into()), (QuestionId::new(1), "A".into())],
            [QuestionId::new(9), QuestionId::new(2)],
        );
        let keys: Vec<_> = store.answers_sorted().into_keys().collect();
        assert_eq!(keys, vec![QuestionId::new(1), QuestionId::new(3)]);
        assert_eq!(
            store.marked_sorted(),
            vec![QuestionId::new(2), QuestionId::new(9)]
        );
    }
}
