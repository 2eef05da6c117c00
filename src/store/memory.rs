use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::store::{RecordStore, SmsRecord, StoreError, StoreEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// In-memory [`RecordStore`], used by tests and ephemeral deployments.
pub struct MemoryStore {
    records: Mutex<BTreeMap<i64, SmsRecord>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: Mutex::new(BTreeMap::new()),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> Result<Vec<SmsRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.values().cloned().collect())
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
        self.records.lock().unwrap().insert(key, record.clone());
        let _ = self.events.send(StoreEvent::Received(record.clone()));
        Ok(record)
    }

    async fn mark_seen(&self, key: i64) -> Result<SmsRecord, StoreError> {
        let record = {
            let mut records = self.records.lock().unwrap();
            let record = records.get_mut(&key).ok_or(StoreError::NotFound(key))?;
            record.seen = true;
            record.clone()
        };
        let _ = self.events.send(StoreEvent::Seen(record.clone()));
        Ok(record)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
