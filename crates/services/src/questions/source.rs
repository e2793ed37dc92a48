use async_trait::async_trait;

use exam_core::model::{Question, SubjectId};

use crate::error::SourceError;

/// What a source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectQuery {
    pub subject_id: SubjectId,
    /// Display name from the subject directory, when the lookup succeeded.
    pub subject_name: Option<String>,
}

/// A well-formed question list as returned by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedExam {
    /// Exam name declared by the payload itself.
    pub name: Option<String>,
    pub duration_minutes: Option<u32>,
    pub questions: Vec<Question>,
}

/// One attempt in the provider cascade.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &'static str;

    /// Fetch and validate the questions for `query`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` for transport failures, non-success statuses,
    /// non-JSON bodies and payloads without a usable question list.
    async fn fetch(&self, query: &SubjectQuery) -> Result<SourcedExam, SourceError>;
}

/// Resolves subject ids to display names.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` when the subject is not listed, or the
    /// transport error of the last directory endpoint tried.
    async fn subject_name(&self, subject_id: SubjectId) -> Result<String, SourceError>;
}
