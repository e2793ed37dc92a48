use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use url::Url;

use exam_core::model::SubjectId;

use super::payload::{find_subject_name, parse_exam};
use super::source::{QuestionSource, SourcedExam, SubjectDirectory, SubjectQuery};
use crate::error::SourceError;

/// The exam backend's REST API rooted at `base_url` (e.g. `http://host/api`).
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    #[must_use]
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{segments...}/`, each segment percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Malformed` if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::Malformed(format!("base url {} has no path", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// GET `url` and decode its JSON body.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` on transport failure, a non-success status, or a
    /// content type other than JSON.
    pub async fn fetch_json(&self, url: Url) -> Result<Value, SourceError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if !content_type.as_deref().is_some_and(is_json) {
            return Err(SourceError::NotJson(content_type));
        }

        Ok(response.json().await?)
    }

    /// The three question endpoints in cascade order.
    #[must_use]
    pub fn question_sources(&self) -> Vec<Arc<dyn QuestionSource>> {
        [
            HttpSourceKind::ExamById,
            HttpSourceKind::QuestionsBySubjectName,
            HttpSourceKind::QuestionsFiltered,
        ]
        .into_iter()
        .map(|kind| Arc::new(HttpQuestionSource::new(self.clone(), kind)) as Arc<dyn QuestionSource>)
        .collect()
    }

    #[must_use]
    pub fn subject_directory(&self) -> HttpSubjectDirectory {
        HttpSubjectDirectory::new(self.clone())
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpSourceKind {
    /// `GET {base}/exams/{subject_id}/`
    ExamById,
    /// `GET {base}/question/{subject_name}/`
    QuestionsBySubjectName,
    /// `GET {base}/questions/?subject={subject_id}`
    QuestionsFiltered,
}

impl HttpSourceKind {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::ExamById => "exam-by-id",
            Self::QuestionsBySubjectName => "questions-by-subject-name",
            Self::QuestionsFiltered => "questions-filtered",
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpQuestionSource {
    api: HttpApi,
    kind: HttpSourceKind,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(api: HttpApi, kind: HttpSourceKind) -> Self {
        Self { api, kind }
    }

    fn url_for(&self, query: &SubjectQuery) -> Result<Url, SourceError> {
        let subject_id = query.subject_id.to_string();
        match self.kind {
            HttpSourceKind::ExamById => self.api.endpoint(&["exams", &subject_id]),
            HttpSourceKind::QuestionsBySubjectName => {
                let name = query
                    .subject_name
                    .as_deref()
                    .ok_or(SourceError::MissingSubjectName)?;
                self.api.endpoint(&["question", name])
            }
            HttpSourceKind::QuestionsFiltered => {
                let mut url = self.api.endpoint(&["questions"])?;
                url.query_pairs_mut().append_pair("subject", &subject_id);
                Ok(url)
            }
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    fn id(&self) -> &'static str {
        self.kind.id()
    }

    async fn fetch(&self, query: &SubjectQuery) -> Result<SourcedExam, SourceError> {
        let url = self.url_for(query)?;
        tracing::debug!(source = self.id(), %url, "fetching questions");
        let body = self.api.fetch_json(url).await?;
        parse_exam(body)
    }
}

/// Subject listing served at `subjects/`, with `qcategories/` as the older
/// alias.
#[derive(Clone, Debug)]
pub struct HttpSubjectDirectory {
    api: HttpApi,
}

impl HttpSubjectDirectory {
    const LISTINGS: [&'static str; 2] = ["subjects", "qcategories"];

    #[must_use]
    pub fn new(api: HttpApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SubjectDirectory for HttpSubjectDirectory {
    async fn subject_name(&self, subject_id: SubjectId) -> Result<String, SourceError> {
        let mut last_error = SourceError::NotFound;
        for listing in Self::LISTINGS {
            let url = self.api.endpoint(&[listing])?;
            match self.api.fetch_json(url).await {
                // The first listing that answers is authoritative.
                Ok(body) => return find_subject_name(&body, subject_id).ok_or(SourceError::NotFound),
                Err(err) => {
                    tracing::debug!(listing, error = %err, "subject listing unavailable");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}
