//! Pure scoring of an answer store against a question list.

use crate::model::{AnswerStore, Question, QuestionId, ScoreBand};

/// Correctness of a single question after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Per-question outcomes plus the aggregate count, in question order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    pub correct_count: u32,
    pub results: Vec<QuestionOutcome>,
}

impl ScoreReport {
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        u32::try_from(self.results.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn unanswered_count(&self) -> u32 {
        let count = self
            .results
            .iter()
            .filter(|outcome| outcome.user_answer.is_none())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Wrong answers, not counting unanswered questions.
    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.total_questions()
            .saturating_sub(self.correct_count)
            .saturating_sub(self.unanswered_count())
    }

    #[must_use]
    pub fn score_percent(&self) -> u32 {
        score_percent(self.correct_count, self.total_questions())
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percent(self.score_percent())
    }

    #[must_use]
    pub fn outcome(&self, id: QuestionId) -> Option<&QuestionOutcome> {
        self.results.iter().find(|outcome| outcome.question_id == id)
    }
}

/// Score `answers` against `questions`.
///
/// A question is correct only when its recorded answer equals its correct
/// option; unanswered questions are incorrect.
#[must_use]
pub fn score(questions: &[Question], answers: &AnswerStore) -> ScoreReport {
    let results: Vec<QuestionOutcome> = questions
        .iter()
        .map(|question| {
            let user_answer = answers.answer(question.id()).map(str::to_owned);
            let is_correct = user_answer
                .as_deref()
                .is_some_and(|answer| question.is_correct(answer));
            QuestionOutcome {
                question_id: question.id(),
                user_answer,
                correct_answer: question.correct_option().to_owned(),
                is_correct,
            }
        })
        .collect();

    let correct = results.iter().filter(|outcome| outcome.is_correct).count();

    ScoreReport {
        correct_count: u32::try_from(correct).unwrap_or(u32::MAX),
        results,
    }
}

/// `round(correct / total * 100)`, with an empty exam scoring 0.
#[must_use]
pub fn score_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(correct) * 100;
    let total = u64::from(total);
    // Round half up, matching `Math.round` for non-negative values.
    let rounded = (scaled * 2 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
