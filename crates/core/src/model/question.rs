use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question needs at least two options, got {len}")]
    TooFewOptions { len: usize },

    #[error("option cannot be empty")]
    EmptyOption,

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("correct option is not one of the options: {0}")]
    UnknownCorrectOption(String),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question, immutable once loaded for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_option: String,
    explanation: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// Options and the correct option are trimmed; a blank explanation is dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, there are fewer than two
    /// options, options repeat, or the correct option is not among them.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: impl Into<String>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }

        let mut seen = HashSet::with_capacity(options.len());
        let mut normalized = Vec::with_capacity(options.len());
        for option in options {
            let option = option.trim().to_string();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption);
            }
            if !seen.insert(option.clone()) {
                return Err(QuestionError::DuplicateOption(option));
            }
            normalized.push(option);
        }

        let correct_option = correct_option.into().trim().to_string();
        if !seen.contains(&correct_option) {
            return Err(QuestionError::UnknownCorrectOption(correct_option));
        }

        let explanation = explanation
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            id,
            text,
            options: normalized,
            correct_option,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns true if `option` is one of this question's options.
    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_option == option
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new(
            QuestionId::new(1),
            " What is 2 + 2? ",
            options(&["3", "4", "5"]),
            "4",
            Some("   ".into()),
        )
        .unwrap();

        assert_eq!(q.text(), "What is 2 + 2?");
        assert_eq!(q.options().len(), 3);
        assert!(q.is_correct("4"));
        assert!(!q.is_correct("3"));
        assert!(q.explanation().is_none());
    }

    #[test]
    fn rejects_duplicate_options() {
        let err = Question::new(
            QuestionId::new(1),
            "Pick",
            options(&["A", " A"]),
            "A",
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateOption("A".into()));
    }

    #[test]
    fn rejects_correct_option_outside_options() {
        let err = Question::new(
            QuestionId::new(1),
            "Pick",
            options(&["A", "B"]),
            "C",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::UnknownCorrectOption(_)));
    }

    #[test]
    fn rejects_single_option() {
        let err =
            Question::new(QuestionId::new(1), "Pick", options(&["A"]), "A", None).unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { len: 1 });
    }
}
