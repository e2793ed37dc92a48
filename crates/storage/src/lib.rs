#![forbid(unsafe_code)]

pub mod gateway;
pub mod repository;
pub mod sqlite;

pub use gateway::{HISTORY_CAP, HISTORY_KEY, PREFERENCES_KEY, PersistenceGateway};
pub use repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};
