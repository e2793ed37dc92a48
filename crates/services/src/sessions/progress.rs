use exam_core::model::QuestionId;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    /// Questions still without an answer.
    pub remaining: usize,
}

impl SessionProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// On the page being shown.
    Current,
    Answered,
    Unanswered,
}

/// Navigator badge for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionStatus {
    pub kind: StatusKind,
    pub marked: bool,
}

/// One row of the post-submission review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub question_id: QuestionId,
    pub text: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    /// `None` when the question has none or explanations are switched off.
    pub explanation: Option<String>,
}
