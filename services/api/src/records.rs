//! Session Record Store
//!
//! Completed practice sessions are kept in process memory for the lifetime of
//! the server. Records are only ever appended; once the store is full the
//! oldest record is evicted.

use podium_core::session::SessionRecord;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Records retained by [`RecordStore::new`].
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

pub struct RecordStore {
    records: RwLock<VecDeque<SessionRecord>>,
    max_records: usize,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_RECORDS)
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store keeping at most `max_records` (at least one) records.
    pub fn with_capacity(max_records: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            max_records: max_records.max(1),
        }
    }

    /// Appends a finished session, evicting the oldest when full.
    pub async fn add(&self, record: SessionRecord) {
        info!(
            scenario = %record.scenario_id,
            score = record.score,
            "Storing session record"
        );
        let mut records = self.records.write().await;
        while records.len() >= self.max_records {
            if let Some(evicted) = records.pop_front() {
                debug!(scenario = %evicted.scenario_id, "Evicted oldest session record");
            }
        }
        records.push_back(record);
    }

    /// All records in the order they were stored, optionally limited to one
    /// scenario.
    pub async fn list(&self, scenario_id: Option<&str>) -> Vec<SessionRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| scenario_id.is_none_or(|id| r.scenario_id == id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
