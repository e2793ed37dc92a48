use std::sync::Arc;

use exam_core::model::{DurationPolicy, ExamError, ExamMetadata, SubjectId};

use super::demo::demo_exam;
use super::http::HttpApi;
use super::source::{QuestionSource, SubjectDirectory, SubjectQuery};

/// Exam chosen for a session, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExam {
    pub exam: ExamMetadata,
    /// True when every source failed and the demo dataset was used.
    pub using_fallback_data: bool,
    /// Id of the source that produced the exam; `None` for the demo dataset.
    pub source: Option<&'static str>,
}

/// Resolves a subject to its questions by trying sources in order.
///
/// The first source returning a well-formed, non-empty question list wins.
/// When all of them fail the demo dataset is returned, so a session can
/// always start.
#[derive(Clone)]
pub struct QuestionDataProvider {
    directory: Option<Arc<dyn SubjectDirectory>>,
    sources: Vec<Arc<dyn QuestionSource>>,
    policy: DurationPolicy,
}

impl QuestionDataProvider {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn QuestionSource>>, policy: DurationPolicy) -> Self {
        Self {
            directory: None,
            sources,
            policy,
        }
    }

    /// Provider over the backend's subject listing and question endpoints.
    #[must_use]
    pub fn from_api(api: &HttpApi, policy: DurationPolicy) -> Self {
        Self::new(api.question_sources(), policy).with_directory(Arc::new(api.subject_directory()))
    }

    /// Provider that always serves the demo dataset.
    #[must_use]
    pub fn offline(policy: DurationPolicy) -> Self {
        Self::new(Vec::new(), policy)
    }

    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn SubjectDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Resolve `subject_id` to an exam.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` only if the bundled demo dataset is invalid; source
    /// failures are logged and never surface here.
    pub async fn resolve(&self, subject_id: SubjectId) -> Result<ResolvedExam, ExamError> {
        let query = SubjectQuery {
            subject_id,
            subject_name: self.lookup_name(subject_id).await,
        };

        for source in &self.sources {
            tracing::debug!(source = source.id(), %subject_id, "trying question source");
            let sourced = match source.fetch(&query).await {
                Ok(sourced) => sourced,
                Err(err) => {
                    tracing::warn!(source = source.id(), %subject_id, error = %err, "question source unavailable");
                    continue;
                }
            };

            let name = sourced
                .name
                .or_else(|| query.subject_name.clone())
                .unwrap_or_default();
            match ExamMetadata::new(
                subject_id,
                name,
                sourced.questions,
                self.policy,
                sourced.duration_minutes,
            ) {
                Ok(exam) => {
                    tracing::info!(
                        source = source.id(),
                        %subject_id,
                        questions = exam.question_count(),
                        "loaded exam"
                    );
                    return Ok(ResolvedExam {
                        exam,
                        using_fallback_data: false,
                        source: Some(source.id()),
                    });
                }
                Err(err) => {
                    tracing::warn!(source = source.id(), %subject_id, error = %err, "question source returned an unusable exam");
                }
            }
        }

        tracing::warn!(%subject_id, "no question source available, using demo questions");
        Ok(ResolvedExam {
            exam: demo_exam(subject_id, self.policy)?,
            using_fallback_data: true,
            source: None,
        })
    }

    async fn lookup_name(&self, subject_id: SubjectId) -> Option<String> {
        let directory = self.directory.as_ref()?;
        match directory.subject_name(subject_id).await {
            Ok(name) => Some(name),
            Err(err) => {
                tracing::warn!(%subject_id, error = %err, "subject lookup failed");
                None
            }
        }
    }
}
