//! Request history CRUD routes

use crate::routes::AppState;
use crate::service::HistoryError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use restbench_common::{
    DeleteResponse, HistoryPage, LogEntry, LogEntryPatch, NewLogEntry, PageRequest, HISTORY_PATH,
};
use serde::Deserialize;

/// Build the history router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(HISTORY_PATH, get(list_entries).post(create_entry))
        .route(
            &format!("{}/{{id}}", HISTORY_PATH),
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

/// Raw pagination query. Kept as strings so bad values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Ids that are not integers cannot name a stored entry
fn parse_id(raw: &str) -> Result<i64, HistoryError> {
    raw.trim().parse().map_err(|_| HistoryError::NotFound)
}

/// Unparseable bodies are a bad request. Valid JSON with missing or mistyped
/// fields fails like a rejected insert.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HistoryError> {
    payload.map(|Json(value)| value).map_err(|rejection| match rejection {
        JsonRejection::JsonDataError(e) => HistoryError::Rejected(e.body_text()),
        other => HistoryError::InvalidRequest(other.body_text()),
    })
}

/// Record a new request/response pair
async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<NewLogEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<LogEntry>), HistoryError> {
    let entry = json_body(payload)?;
    let created = state.history.create(entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List history, newest first
async fn list_entries(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<HistoryPage>, HistoryError> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!("Ignoring unreadable query: {}", rejection.body_text());
            ListQuery::default()
        }
    };
    let page = state.history.list(query.page_request()).await?;
    Ok(Json(page))
}

/// Get a single entry
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LogEntry>, HistoryError> {
    let entry = state.history.get(parse_id(&id)?).await?;
    Ok(Json(entry))
}

/// Overwrite the supplied fields of an entry
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LogEntryPatch>, JsonRejection>,
) -> Result<Json<LogEntry>, HistoryError> {
    let id = parse_id(&id)?;
    let patch = json_body(payload)?;
    let entry = state.history.update(id, patch).await?;
    Ok(Json(entry))
}

/// Permanently remove an entry
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, HistoryError> {
    state.history.delete(parse_id(&id)?).await?;
    Ok(Json(DeleteResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(HistoryError::NotFound)));
        assert!(matches!(parse_id(""), Err(HistoryError::NotFound)));
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.page_request(), PageRequest::default());

        let query = ListQuery {
            page: Some("3".into()),
            limit: Some("abc".into()),
        };
        assert_eq!(query.page_request(), PageRequest::new(3, 10));
    }
}
