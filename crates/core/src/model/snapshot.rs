use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answers::AnswerStore;
use crate::model::ids::QuestionId;

/// Serialized in-progress session state used to resume an exam later.
///
/// Field names follow the browser client's stored shape, so older entries
/// (`currentPage`, `timeLeft`, `markedQuestions`, `timestamp`) still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub session_key: String,
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, String>,
    #[serde(default, alias = "currentPage")]
    pub current_question_index: usize,
    #[serde(alias = "timeLeft")]
    pub time_remaining_seconds: u32,
    #[serde(default, alias = "markedQuestions")]
    pub marked: Vec<QuestionId>,
    #[serde(alias = "timestamp")]
    pub saved_at: DateTime<Utc>,
}

impl PersistedSnapshot {
    /// Capture the answer store and position of a running session.
    #[must_use]
    pub fn capture(
        session_key: impl Into<String>,
        answers: &AnswerStore,
        current_question_index: usize,
        time_remaining_seconds: u32,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_key: session_key.into(),
            answers: answers.answers_sorted(),
            current_question_index,
            time_remaining_seconds,
            marked: answers.marked_sorted(),
            saved_at,
        }
    }

    /// Rebuild the answer store this snapshot was captured from.
    #[must_use]
    pub fn answer_store(&self) -> AnswerStore {
        AnswerStore::from_parts(
            self.answers
                .iter()
                .map(|(id, option)| (*id, option.clone())),
            self.marked.iter().copied(),
        )
    }
}
