//! Client for the history server's CRUD API

use reqwest::{Client, Response, StatusCode};
use restbench_common::{
    DeleteResponse, ErrorBody, HistoryPage, LogEntry, LogEntryPatch, NewLogEntry, PageRequest,
    HISTORY_PATH,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Per-request timeout for history calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("History entry not found")]
    NotFound,

    #[error("History server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Failed to reach history server: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for the `/history` endpoints
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
    client: Client,
}

impl HistoryClient {
    /// Create a new history client
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, HISTORY_PATH)
    }

    fn entry_url(&self, id: i64) -> String {
        format!("{}{}/{}", self.base_url, HISTORY_PATH, id)
    }

    /// Record a dispatched request
    pub async fn create(&self, entry: &NewLogEntry) -> Result<LogEntry, ClientError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(entry)
            .send()
            .await?;
        parse(response).await
    }

    /// Fetch one page of history
    pub async fn list(&self, page: PageRequest) -> Result<HistoryPage, ClientError> {
        let response = self
            .client
            .get(self.collection_url())
            .query(&[("page", page.page), ("limit", page.limit)])
            .send()
            .await?;
        parse(response).await
    }

    pub async fn get(&self, id: i64) -> Result<LogEntry, ClientError> {
        let response = self.client.get(self.entry_url(id)).send().await?;
        parse(response).await
    }

    pub async fn update(&self, id: i64, patch: &LogEntryPatch) -> Result<LogEntry, ClientError> {
        let response = self
            .client
            .put(self.entry_url(id))
            .json(patch)
            .send()
            .await?;
        parse(response).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let response = self.client.delete(self.entry_url(id)).send().await?;
        let _: DeleteResponse = parse(response).await?;
        Ok(())
    }
}

/// Map the response status onto `ClientError`, then decode the body
async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json().await?)
}
