use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use exam_core::model::{QuestionId, SubjectId};

use crate::error::SubmitError;
use crate::questions::HttpApi;

/// Counts computed by the backend for a submitted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteGrade {
    pub correct_count: u32,
    pub total_questions: u32,
}

/// Server-side grading of a submitted answer set.
#[async_trait]
pub trait Grader: Send + Sync {
    /// # Errors
    ///
    /// Returns `SubmitError` when the grade cannot be obtained; callers keep
    /// their local score in that case.
    async fn grade(
        &self,
        subject_id: SubjectId,
        answers: &BTreeMap<QuestionId, String>,
    ) -> Result<RemoteGrade, SubmitError>;
}

/// `POST {base}/exams/{id}/submit/` grader.
#[derive(Clone, Debug)]
pub struct RemoteGrader {
    api: HttpApi,
}

impl RemoteGrader {
    #[must_use]
    pub fn new(api: HttpApi) -> Self {
        Self { api }
    }
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    answers: &'a BTreeMap<QuestionId, String>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    correct_count: Option<u32>,
    #[serde(default)]
    total_questions: Option<u32>,
}

#[async_trait]
impl Grader for RemoteGrader {
    async fn grade(
        &self,
        subject_id: SubjectId,
        answers: &BTreeMap<QuestionId, String>,
    ) -> Result<RemoteGrade, SubmitError> {
        let url = self
            .api
            .endpoint(&["exams", &subject_id.to_string(), "submit"])
            .map_err(|err| SubmitError::Malformed(err.to_string()))?;

        let response = self
            .api
            .client()
            .post(url)
            .json(&SubmitRequest { answers })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SubmitError::HttpStatus(response.status()));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|err| SubmitError::Malformed(err.to_string()))?;

        match (body.correct_count, body.total_questions) {
            (Some(correct_count), Some(total_questions))
                if total_questions > 0 && correct_count <= total_questions =>
            {
                Ok(RemoteGrade {
                    correct_count,
                    total_questions,
                })
            }
            (correct, total) => Err(SubmitError::Malformed(format!(
                "unusable counts: correct={correct:?} total={total:?}"
            ))),
        }
    }
}
