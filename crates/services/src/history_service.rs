use exam_core::model::ExamResult;
use storage::gateway::PersistenceGateway;
use storage::repository::StorageError;

/// Read access to past attempts, newest first.
#[derive(Clone)]
pub struct HistoryService {
    gateway: PersistenceGateway,
}

impl HistoryService {
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Up to `limit` most recent results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the store cannot be read.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ExamResult>, StorageError> {
        let mut history = self.gateway.history().await?;
        history.truncate(limit);
        Ok(history)
    }

    /// # Errors
    ///
    /// Returns `StorageError` when the store cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.gateway.clear_history().await
    }
}
