use exam_core::model::{ExamPreferences, ExamPreferencesDraft};
use storage::gateway::PersistenceGateway;
use storage::repository::StorageError;

#[derive(Clone)]
pub struct PreferencesService {
    gateway: PersistenceGateway,
}

impl PreferencesService {
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Load stored preferences (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the store cannot be read.
    pub async fn load(&self) -> Result<ExamPreferences, StorageError> {
        self.gateway.load_preferences().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` when the store cannot be written.
    pub async fn save(&self, prefs: ExamPreferences) -> Result<ExamPreferences, StorageError> {
        self.gateway.save_preferences(&prefs).await?;
        Ok(prefs)
    }

    /// Overlay `draft` onto the stored preferences and persist the outcome.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or write failures.
    pub async fn update(&self, draft: ExamPreferencesDraft) -> Result<ExamPreferences, StorageError> {
        let current = self.load().await?;
        self.save(draft.apply(current)).await
    }
}
