//! In-memory request log store

use chrono::Utc;
use restbench_common::{LogEntry, LogEntryPatch, NewLogEntry};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    entries: BTreeMap<i64, LogEntry>,
}

/// Process-local store. Contents are lost on shutdown.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entry: NewLogEntry) -> LogEntry {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let stored = LogEntry {
            id: inner.last_id,
            method: entry.method,
            url: entry.url,
            headers: entry.headers,
            body: entry.body,
            response: entry.response,
            status_code: entry.status_code,
            created_at: Utc::now(),
        };
        inner.entries.insert(stored.id, stored.clone());
        stored
    }

    pub async fn find_by_id(&self, id: i64) -> Option<LogEntry> {
        self.inner.read().await.entries.get(&id).cloned()
    }

    pub async fn find_page(&self, offset: u64, limit: u64) -> (Vec<LogEntry>, u64) {
        let inner = self.inner.read().await;

        let mut ordered: Vec<&LogEntry> = inner.entries.values().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = ordered
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        (page, inner.entries.len() as u64)
    }

    pub async fn update(&self, id: i64, patch: &LogEntryPatch) -> Option<LogEntry> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(&id)?;
        patch.apply_to(entry);
        Some(entry.clone())
    }

    pub async fn delete(&self, id: i64) -> bool {
        self.inner.write().await.entries.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
