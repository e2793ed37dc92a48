use std::env;
use std::time::Duration;

use exam_core::model::DurationPolicy;
use reqwest::Client;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Runtime settings for talking to the exam backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamConfig {
    pub base_url: Url,
    pub http_timeout: Duration,
    pub remote_submit: bool,
    pub duration_policy: DurationPolicy,
}

impl ExamConfig {
    /// Defaults pointing at a locally running backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            remote_submit: false,
            duration_policy: DurationPolicy::default(),
        })
    }

    /// Read `EXAM_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ExamConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = value("EXAM_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = value("EXAM_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Timeout(raw.clone()))?;
            if secs == 0 {
                return Err(ConfigError::Timeout(raw));
            }
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = value("EXAM_REMOTE_SUBMIT") {
            config.remote_submit = parse_flag(&raw);
        }

        if let Some(raw) = value("EXAM_DURATION_POLICY") {
            config.duration_policy = parse_duration_policy(&raw)?;
        }

        Ok(config)
    }

    /// Replace the backend URL, e.g. from a command-line flag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `raw` is not an absolute http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    /// Build the HTTP client shared by question sources and the grader.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder().timeout(self.http_timeout).build()
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::CannotBeABase(raw.to_string()));
    }
    Ok(url)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_duration_policy(raw: &str) -> Result<DurationPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "per-question" | "per_question" => Ok(DurationPolicy::PerQuestion),
        "server" | "server-declared" | "server_declared" => Ok(DurationPolicy::ServerDeclared),
        _ => Err(ConfigError::DurationPolicy(raw.to_string())),
    }
}
