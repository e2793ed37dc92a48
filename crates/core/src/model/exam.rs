use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, SubjectId};
use crate::model::question::Question;

/// Seconds granted per question when no other duration applies.
pub const SECONDS_PER_QUESTION: u32 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam has no questions")]
    NoQuestions,

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("too many questions for a timed exam: {len}")]
    TooManyQuestions { len: usize },
}

/// How the countdown length of an exam is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationPolicy {
    /// `questions.len() * 60` seconds, ignoring any server-declared duration.
    #[default]
    PerQuestion,
    /// A positive `duration_minutes` from the exam payload wins; otherwise per question.
    ServerDeclared,
}

impl DurationPolicy {
    /// Compute the exam duration in seconds.
    #[must_use]
    pub fn duration_seconds(self, question_count: u32, declared_minutes: Option<u32>) -> u32 {
        let per_question = question_count.saturating_mul(SECONDS_PER_QUESTION);
        match (self, declared_minutes) {
            (Self::ServerDeclared, Some(minutes)) if minutes > 0 => minutes.saturating_mul(60),
            _ => per_question,
        }
    }
}

/// Everything a session needs to know about the exam being taken.
///
/// Created once per session start and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamMetadata {
    subject_id: SubjectId,
    subject_name: String,
    duration_seconds: u32,
    questions: Vec<Question>,
}

impl ExamMetadata {
    /// Build exam metadata, deriving the duration from `policy`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoQuestions` for an empty list and
    /// `ExamError::DuplicateQuestion` when two questions share an id.
    pub fn new(
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        questions: Vec<Question>,
        policy: DurationPolicy,
        declared_minutes: Option<u32>,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(ExamError::DuplicateQuestion(question.id()));
            }
        }

        let count = u32::try_from(questions.len())
            .map_err(|_| ExamError::TooManyQuestions { len: questions.len() })?;

        let subject_name = subject_name.into().trim().to_string();
        let subject_name = if subject_name.is_empty() {
            format!("Subject {subject_id}")
        } else {
            subject_name
        };

        Ok(Self {
            subject_id,
            subject_name,
            duration_seconds: policy.duration_seconds(count, declared_minutes),
            questions,
        })
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }

    #[must_use]
    pub fn session_key(&self) -> String {
        self.subject_id.session_key()
    }
}
