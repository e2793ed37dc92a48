//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::ExamError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Why a question source could not produce a usable exam.
///
/// Every variant is recovered by the provider cascade; callers only ever see
/// the `using_fallback_data` flag.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("expected a JSON response, got content type {0:?}")]
    NotJson(Option<String>),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("no questions found")]
    NotFound,
    #[error("subject name is not known")]
    MissingSubjectName,
}

/// Errors emitted by `RemoteGrader`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("submit request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("malformed grade response: {0}")]
    Malformed(String),
}

/// Errors emitted while reading `ExamConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid EXAM_API_BASE_URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("base url cannot carry a path: {0}")]
    CannotBeABase(String),
    #[error("invalid EXAM_HTTP_TIMEOUT_SECS: {0}")]
    Timeout(String),
    #[error("invalid EXAM_DURATION_POLICY: {0}")]
    DurationPolicy(String),
}

/// Errors emitted by session workflow operations that must reach the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Exam(#[from] ExamError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
