use std::fmt;

use exam_core::model::ExamResult;

use super::progress::ReviewItem;

/// Format seconds as `m:ss`.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Plain-text summary of a finished attempt, with optional per-question review.
#[derive(Debug, Clone)]
pub struct ResultReport<'a> {
    result: &'a ExamResult,
    review: &'a [ReviewItem],
}

impl<'a> ResultReport<'a> {
    #[must_use]
    pub fn new(result: &'a ExamResult, review: &'a [ReviewItem]) -> Self {
        Self { result, review }
    }

    /// One-line message suitable for sharing.
    #[must_use]
    pub fn share_text(&self) -> String {
        format!(
            "I scored {}% on {} exam! Correct answers: {}/{}",
            self.result.score_percent(),
            self.result.subject_name(),
            self.result.correct_count(),
            self.result.total_questions(),
        )
    }
}

impl fmt::Display for ResultReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        writeln!(f, "{} results", result.subject_name())?;
        writeln!(
            f,
            "Score: {}% ({})",
            result.score_percent(),
            result.band().label()
        )?;
        writeln!(f, "Correct: {}", result.correct_count())?;
        writeln!(f, "Incorrect: {}", result.incorrect_count())?;
        writeln!(f, "Total: {}", result.total_questions())?;
        writeln!(f, "Time spent: {}", format_clock(result.time_spent_seconds()))?;
        if result.using_fallback_data() {
            writeln!(f, "(demo questions)")?;
        }

        for (index, item) in self.review.iter().enumerate() {
            writeln!(f)?;
            let verdict = if item.is_correct { "correct" } else { "incorrect" };
            writeln!(f, "{}. {} [{verdict}]", index + 1, item.text)?;
            writeln!(
                f,
                "   your answer: {}",
                item.user_answer.as_deref().unwrap_or("(none)")
            )?;
            writeln!(f, "   correct answer: {}", item.correct_answer)?;
            if let Some(explanation) = &item.explanation {
                writeln!(f, "   {explanation}")?;
            }
        }
        Ok(())
    }
}
