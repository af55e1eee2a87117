//! History service: CRUD over the record store

use crate::store::{Store, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use restbench_common::{ErrorBody, HistoryPage, LogEntry, LogEntryPatch, NewLogEntry, PageRequest};

/// Service-level failures
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    InvalidRequest(String),

    /// Well-formed JSON that does not fit the record shape
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl HistoryError {
    pub fn status(&self) -> StatusCode {
        match self {
            HistoryError::NotFound => StatusCode::NOT_FOUND,
            HistoryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HistoryError::Rejected(_) | HistoryError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HistoryError {
    fn into_response(self) -> Response {
        if let HistoryError::Storage(e) = &self {
            tracing::error!("Storage error: {}", e);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Stateless mapping from history operations to the store
#[derive(Debug, Clone)]
pub struct HistoryService {
    store: Store,
}

impl HistoryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Record a dispatched request. `createdAt` is always set by the store.
    pub async fn create(&self, entry: NewLogEntry) -> Result<LogEntry, HistoryError> {
        let created = self.store.insert(entry).await?;
        tracing::debug!("Recorded {} {} as #{}", created.method, created.url, created.id);
        Ok(created)
    }

    /// Newest-first page of history
    pub async fn list(&self, page: PageRequest) -> Result<HistoryPage, HistoryError> {
        let (data, total) = self
            .store
            .find_page(page.offset(), page.limit as u64)
            .await?;
        Ok(HistoryPage { data, total })
    }

    pub async fn get(&self, id: i64) -> Result<LogEntry, HistoryError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(HistoryError::NotFound)
    }

    /// Merge supplied fields into an existing entry
    pub async fn update(&self, id: i64, patch: LogEntryPatch) -> Result<LogEntry, HistoryError> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        self.store
            .update(id, &patch)
            .await?
            .ok_or(HistoryError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), HistoryError> {
        if self.store.delete(id).await? {
            tracing::debug!("Deleted history entry #{}", id);
            Ok(())
        } else {
            Err(HistoryError::NotFound)
        }
    }
}
