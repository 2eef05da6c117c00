use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tokio::sync::broadcast;

use crate::store::{RecordStore, SmsRecord, StoreError, StoreEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sms_messages (
    key INTEGER PRIMARY KEY,
    sender TEXT NOT NULL,
    body TEXT NOT NULL,
    seen INTEGER NOT NULL DEFAULT 0,
    timestamp INTEGER NOT NULL
)";

/// Durable [`RecordStore`] over SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        info!("SMS record store ready at {}", database_url);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self { pool, events })
    }

    async fn fetch(&self, key: i64) -> Result<SmsRecord, StoreError> {
        let row = sqlx::query(
            "SELECT key, sender, body, seen, timestamp FROM sms_messages WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(key))?;
        Ok(record_from_row(&row))
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> SmsRecord {
    SmsRecord {
        key: row.get("key"),
        from: row.get("sender"),
        body: row.get("body"),
        seen: row.get::<i64, _>("seen") != 0,
        timestamp: row.get("timestamp"),
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn list(&self) -> Result<Vec<SmsRecord>, StoreError> {
        let rows =
            sqlx::query("SELECT key, sender, body, seen, timestamp FROM sms_messages ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn insert(&self, from: String, body: String) -> Result<SmsRecord, StoreError> {
        let key = Utc::now().timestamp_millis();
        let record = SmsRecord {
            key,
            from,
            body,
            seen: false,
            timestamp: key,
        };
        // REPLACE mirrors the keyed-set semantics of the upstream store:
        // a same-millisecond key overwrites.
        sqlx::query(
            "INSERT OR REPLACE INTO sms_messages (key, sender, body, seen, timestamp)
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(record.key)
        .bind(&record.from)
        .bind(&record.body)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        let _ = self.events.send(StoreEvent::Received(record.clone()));
        Ok(record)
    }

    async fn mark_seen(&self, key: i64) -> Result<SmsRecord, StoreError> {
        let result = sqlx::query("UPDATE sms_messages SET seen = 1 WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(key));
        }
        let record = self.fetch(key).await?;
        let _ = self.events.send(StoreEvent::Seen(record.clone()));
        Ok(record)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
