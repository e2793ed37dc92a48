//! Typed persistence of exam snapshots, preferences and history over a
//! [`KeyValueStore`].

use std::sync::Arc;

use exam_core::model::{ExamPreferences, ExamResult, PersistedSnapshot};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::repository::{KeyValueStore, StorageError};

/// Key holding the shared exam toggles.
pub const PREFERENCES_KEY: &str = "exam-preferences";
/// Key holding submitted results, newest first.
pub const HISTORY_KEY: &str = "exam-history";
/// Most recent results kept in the history log.
pub const HISTORY_CAP: usize = 50;

fn encode<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Session-facing persistence: one snapshot per session key, plus
/// preferences and history shared by all sessions.
///
/// Unreadable entries load as absent (with a warning) so a corrupted cache
/// never prevents a session from starting.
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store `snapshot` under `key`, overwriting any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save(&self, key: &str, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        let raw = encode(snapshot)?;
        self.store.set(key, &raw).await
    }

    /// Load the snapshot under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A malformed entry
    /// is reported as `Ok(None)`.
    pub async fn load(&self, key: &str) -> Result<Option<PersistedSnapshot>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match decode::<PersistedSnapshot>(&raw) {
            Ok(mut snapshot) => {
                if snapshot.session_key.is_empty() {
                    key.clone_into(&mut snapshot.session_key);
                }
                Ok(Some(snapshot))
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable snapshot");
                Ok(None)
            }
        }
    }

    /// Delete the snapshot under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key).await
    }

    /// Stored preferences, or defaults when missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn load_preferences(&self) -> Result<ExamPreferences, StorageError> {
        let Some(raw) = self.store.get(PREFERENCES_KEY).await? else {
            return Ok(ExamPreferences::default());
        };
        Ok(decode(&raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to parse preferences, using defaults");
            ExamPreferences::default()
        }))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save_preferences(&self, prefs: &ExamPreferences) -> Result<(), StorageError> {
        let raw = encode(prefs)?;
        self.store.set(PREFERENCES_KEY, &raw).await
    }

    /// Submitted results, newest first.
    ///
    /// Entries that cannot be decoded are skipped; a log that is not a JSON
    /// array reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn history(&self) -> Result<Vec<ExamResult>, StorageError> {
        let entries = match self.history_entries().await {
            Ok(entries) => entries,
            Err(StorageError::Serialization(err)) => {
                tracing::warn!(error = %err, "exam history is not a list, ignoring it");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                serde_json::from_value(entry)
                    .inspect_err(|err| {
                        tracing::warn!(index, error = %err, "skipping unreadable history entry");
                    })
                    .ok()
            })
            .collect())
    }

    /// Prepend `result` to the history, keeping the newest `HISTORY_CAP` entries.
    ///
    /// Existing entries are kept as stored, including ones this version cannot
    /// decode.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read or written, and
    /// `StorageError::Serialization` without writing anything if the stored
    /// log is not a JSON array.
    pub async fn append_history(&self, result: &ExamResult) -> Result<(), StorageError> {
        let mut entries = self.history_entries().await?;
        let attempt_id = result.attempt_id().to_string();
        entries.retain(|entry| {
            entry.get("attemptId").and_then(Value::as_str) != Some(attempt_id.as_str())
        });
        let entry =
            serde_json::to_value(result).map_err(|e| StorageError::Serialization(e.to_string()))?;
        entries.insert(0, entry);
        entries.truncate(HISTORY_CAP);
        let raw = encode(&entries)?;
        self.store.set(HISTORY_KEY, &raw).await
    }

    async fn history_entries(&self) -> Result<Vec<Value>, StorageError> {
        match self.store.get(HISTORY_KEY).await? {
            Some(raw) => decode(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear_history(&self) -> Result<(), StorageError> {
        self.store.remove(HISTORY_KEY).await
    }
}
