//! Local key-value storage: unordered string keys to JSON string values.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::error;

use crate::db::repository;
use crate::error::AppError;

/// No transactions and no prefix queries: `list_keys` plus client-side
/// filtering is the only way to enumerate entries.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
    async fn list_keys(&self) -> Result<Vec<String>, AppError>;
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, String)>, AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Opens (creating if needed) the database at `database_url` and runs migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

fn read_error(op: &str, key: &str, e: sqlx::Error) -> AppError {
    error!("store {} failed for {:?}: {}", op, key, e);
    AppError::StoreRead(e.to_string())
}

fn write_error(op: &str, key: &str, e: sqlx::Error) -> AppError {
    error!("store {} failed for {:?}: {}", op, key, e);
    AppError::StoreWrite(e.to_string())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        repository::get_value(&self.db, key)
            .await
            .map_err(|e| read_error("get", key, e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        repository::set_value(&self.db, key, value)
            .await
            .map_err(|e| write_error("set", key, e))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        repository::remove_value(&self.db, key)
            .await
            .map(|_| ())
            .map_err(|e| write_error("remove", key, e))
    }

    async fn list_keys(&self) -> Result<Vec<String>, AppError> {
        repository::list_keys(&self.db)
            .await
            .map_err(|e| read_error("list_keys", "*", e))
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, String)>, AppError> {
        repository::multi_get(&self.db, keys)
            .await
            .map_err(|e| read_error("multi_get", "*", e))
    }

    async fn clear(&self) -> Result<(), AppError> {
        repository::clear(&self.db)
            .await
            .map(|_| ())
            .map_err(|e| write_error("clear", "*", e))
    }
}

/// Process-local store, used in tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, AppError> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, String)>, AppError> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
