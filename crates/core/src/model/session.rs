use serde::{Deserialize, Serialize};

use crate::model::answers::AnswerStore;

/// Lifecycle of an exam attempt.
///
/// `NotStarted → InProgress → Submitted ⇄ Review`; there is no way back to
/// `InProgress` other than a restart. `Study` sits beside the timed path and
/// can be entered from any mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    #[default]
    NotStarted,
    InProgress,
    Submitted,
    /// Read-only overlay on a submitted attempt revealing correct answers.
    Review,
    /// Untimed browsing: each question is answered once and its correct
    /// answer is revealed right away. Nothing is scored or saved.
    Study,
}

impl SessionMode {
    /// True once the attempt has been scored.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Submitted | Self::Review)
    }

    #[must_use]
    pub fn accepts_answers(self) -> bool {
        matches!(self, Self::InProgress | Self::Study)
    }
}

/// Point-in-time copy of a session for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: SessionMode,
    pub time_remaining_seconds: u32,
    pub answers: AnswerStore,
    pub current_question_index: usize,
}

impl SessionState {
    /// State of a session that has loaded its questions but not started.
    #[must_use]
    pub fn fresh(duration_seconds: u32) -> Self {
        Self {
            mode: SessionMode::NotStarted,
            time_remaining_seconds: duration_seconds,
            answers: AnswerStore::new(),
            current_question_index: 0,
        }
    }
}
