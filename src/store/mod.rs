//! Keyed record store for the SMS inbox: list, insert under a generated
//! timestamp key, flip the seen flag, and subscribe to live changes.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

fn unknown_sender() -> String {
    "Unknown".to_string()
}

/// One stored SMS record. Keyed by insertion timestamp in milliseconds; a
/// same-millisecond insert overwrites the earlier record (no dedup
/// guarantee, matching the upstream keying scheme).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecord {
    pub key: i64,
    #[serde(default = "unknown_sender")]
    pub from: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub seen: bool,
    pub timestamp: i64,
}

impl SmsRecord {
    /// Applies the read-side defaults: a blank sender reads as "Unknown".
    pub fn sanitized(mut self) -> Self {
        if self.from.is_empty() {
            self.from = unknown_sender();
        }
        self
    }
}

/// Change notifications emitted to live subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    Received(SmsRecord),
    Seen(SmsRecord),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(i64),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records in key order.
    async fn list(&self) -> Result<Vec<SmsRecord>, StoreError>;

    /// Inserts a record under a fresh timestamp key with `seen = false`.
    async fn insert(&self, from: String, body: String) -> Result<SmsRecord, StoreError>;

    /// Durably flips `seen` to true. Idempotent.
    async fn mark_seen(&self, key: i64) -> Result<SmsRecord, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
