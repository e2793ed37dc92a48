use std::sync::Arc;

use storage::gateway::PersistenceGateway;
use storage::repository::Storage;

use crate::Clock;
use crate::config::ExamConfig;
use crate::error::AppServicesError;
use crate::grading::RemoteGrader;
use crate::history_service::HistoryService;
use crate::preferences_service::PreferencesService;
use crate::questions::{HttpApi, QuestionDataProvider};
use crate::sessions::ExamSessionService;

/// Assembles app-facing services over one storage backend and one API client.
#[derive(Clone)]
pub struct AppServices {
    config: ExamConfig,
    sessions: Arc<ExamSessionService>,
    preferences: Arc<PreferencesService>,
    history: Arc<HistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client
    /// setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: ExamConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock, config)
    }

    /// Build services over process-local storage; nothing survives a restart.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn in_memory(clock: Clock, config: ExamConfig) -> Result<Self, AppServicesError> {
        Self::from_storage(&Storage::in_memory(), clock, config)
    }

    fn from_storage(
        storage: &Storage,
        clock: Clock,
        config: ExamConfig,
    ) -> Result<Self, AppServicesError> {
        let gateway = PersistenceGateway::new(Arc::clone(&storage.kv));
        let api = HttpApi::new(config.http_client()?, config.base_url.clone());

        let provider = QuestionDataProvider::from_api(&api, config.duration_policy);
        let mut sessions = ExamSessionService::new(clock, provider, gateway.clone());
        if config.remote_submit {
            sessions = sessions.with_grader(Arc::new(RemoteGrader::new(api)));
        }

        Ok(Self {
            config,
            sessions: Arc::new(sessions),
            preferences: Arc::new(PreferencesService::new(gateway.clone())),
            history: Arc::new(HistoryService::new(gateway)),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<ExamSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<PreferencesService> {
        Arc::clone(&self.preferences)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }
}
