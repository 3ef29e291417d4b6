use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// StoreError
///
/// The narrow failure surface of the persistence collaborator. Managers map
/// these onto the ApiError taxonomy; raw backend detail stays behind this
/// boundary (logged, never returned to callers).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a record with that key already exists")]
    Conflict,
    #[error("no record with that key exists")]
    NotFound,
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Store
///
/// The persistence collaborator contract: durable key -> record storage scoped
/// by collection name, one operation per record. This trait is the only way
/// the orchestration layer touches storage, which lets us swap the concrete
/// implementation (Postgres in production, `MemoryStore` in tests) without
/// affecting the managers.
///
/// Records are JSON values; the managers own (de)serialization to their typed
/// models. No multi-record transaction exists on this contract: read-modify-
/// write sequences over it can race (last-write-wins at the record level).
#[async_trait]
pub trait Store: Send + Sync {
    /// Creates a record. Fails with `Conflict` if the key already exists.
    async fn create(&self, collection: &str, key: &str, record: Value) -> Result<(), StoreError>;

    /// Reads a record. Fails with `NotFound` if absent.
    async fn read(&self, collection: &str, key: &str) -> Result<Value, StoreError>;

    /// Replaces an existing record. Fails with `NotFound` if absent.
    async fn update(&self, collection: &str, key: &str, record: Value) -> Result<(), StoreError>;

    /// Deletes a record. Fails with `NotFound` if absent.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    /// Lists every key in a collection (empty vec if none).
    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError>;
}

/// StoreState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type StoreState = Arc<dyn Store>;

/// PostgresStore
///
/// The production `Store` implementation: one `records` table with a composite
/// primary key over (collection, key), records held as JSON text. Queries use
/// the runtime API so the crate builds without a live database.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Creates the backing table if it does not exist. Idempotent; safe to call
    /// at startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                key        TEXT NOT NULL,
                record     TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("ensure_schema error: {:?}", e);
            StoreError::Backend(e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn create(&self, collection: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO records (collection, key, record) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(key)
            .bind(record.to_string())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                Err(StoreError::Conflict)
            }
            Err(e) => {
                tracing::error!("store create error [{}/{}]: {:?}", collection, key, e);
                Err(StoreError::Backend(e.to_string()))
            }
        }
    }

    async fn read(&self, collection: &str, key: &str) -> Result<Value, StoreError> {
        let row = sqlx::query("SELECT record FROM records WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("store read error [{}/{}]: {:?}", collection, key, e);
                StoreError::Backend(e.to_string())
            })?;

        match row {
            Some(row) => {
                let text: String = row.get("record");
                serde_json::from_str(&text).map_err(|e| {
                    // A record we wrote but cannot parse back is a backend-level fault.
                    tracing::error!("store parse error [{}/{}]: {:?}", collection, key, e);
                    StoreError::Backend(e.to_string())
                })
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn update(&self, collection: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE records SET record = $3 WHERE collection = $1 AND key = $2")
                .bind(collection)
                .bind(key)
                .bind(record.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("store update error [{}/{}]: {:?}", collection, key, e);
                    StoreError::Backend(e.to_string())
                })?;

        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("store delete error [{}/{}]: {:?}", collection, key, e);
                StoreError::Backend(e.to_string())
            })?;

        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT key FROM records WHERE collection = $1 ORDER BY key")
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("store list error [{}]: {:?}", collection, e);
                StoreError::Backend(e.to_string())
            })?;

        Ok(rows.iter().map(|row| row.get("key")).collect())
    }
}

/// MemoryStore
///
/// An in-memory `Store` used in tests and available for local experimentation.
/// Behaviour mirrors the Postgres implementation's contract exactly: create
/// conflicts on existing keys, update/delete report NotFound on absent ones.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(&self, collection: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        if records.contains_key(key) {
            return Err(StoreError::Conflict);
        }
        records.insert(key.to_string(), record);
        Ok(())
    }

    async fn read(&self, collection: &str, key: &str) -> Result<Value, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, collection: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or(StoreError::NotFound)?;
        match records.get_mut(key) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or(StoreError::NotFound)?;
        match records.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let collections = self.collections.read().await;
        let mut keys: Vec<String> = collections
            .get(collection)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
