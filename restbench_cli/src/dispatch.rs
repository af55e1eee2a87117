//! Request dispatcher
//!
//! Sends one user-composed request, captures the status and payload for
//! display, and records the exchange in the history server. Recording is
//! best-effort: its outcome is reported next to the response but never
//! changes it, and it is never retried.

use crate::history_client::HistoryClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use restbench_common::{HttpVerb, NewLogEntry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};

/// Status shown for any dispatch that did not produce a response
pub const FAILED_STATUS: u16 = 500;

/// Payload shown for any dispatch that did not produce a response
pub const FAILED_MESSAGE: &str = "Request failed";

/// A request as the user typed it
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub method: HttpVerb,
    pub url: String,
    /// JSON object of header names to values
    pub headers: String,
    /// JSON body; only read for POST and PUT
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Headers must be a JSON object: {0}")]
    InvalidHeaders(String),

    #[error("Body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Request could not be completed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Another request is already in flight")]
    Busy,
}

/// Status and payload shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayResponse {
    pub status: u16,
    pub data: Value,
}

impl DisplayResponse {
    /// Synthetic response for a dispatch that failed before or during the call
    pub fn failed() -> Self {
        Self {
            status: FAILED_STATUS,
            data: Value::String(FAILED_MESSAGE.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What happened to the history record of a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum LogStatus {
    /// Stored under this id
    Recorded(i64),
    /// The history server rejected or never received it
    Failed(String),
    /// Nothing to record because the dispatch itself failed
    Skipped,
}

/// Result of one dispatch
#[derive(Debug)]
pub struct DispatchOutcome {
    pub response: DisplayResponse,
    pub log: LogStatus,
    /// Why the synthetic failure response was shown, if it was
    pub failure: Option<DispatchError>,
}

/// Headers and body after parsing the user's input
#[derive(Debug)]
pub struct PreparedRequest {
    pub headers: HeaderMap,
    /// Headers as recorded in history
    pub header_json: Value,
    pub body: Option<Value>,
    raw_body: Option<String>,
}

/// Parse headers and body. Nothing is sent if this fails.
pub fn prepare(request: &DispatchRequest) -> Result<PreparedRequest, DispatchError> {
    let header_json: Value = serde_json::from_str(&request.headers)
        .map_err(|e| DispatchError::InvalidHeaders(e.to_string()))?;
    let object = header_json
        .as_object()
        .ok_or_else(|| DispatchError::InvalidHeaders("expected an object".to_string()))?;
    let headers = to_header_map(object)?;

    let (body, raw_body) = if request.method.carries_body() {
        let parsed: Value = serde_json::from_str(&request.body).map_err(DispatchError::InvalidBody)?;
        (Some(parsed), Some(request.body.clone()))
    } else {
        (None, None)
    };

    Ok(PreparedRequest {
        headers,
        header_json,
        body,
        raw_body,
    })
}

fn to_header_map(object: &Map<String, Value>) -> Result<HeaderMap, DispatchError> {
    let mut headers = HeaderMap::with_capacity(object.len());
    for (name, value) in object {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(DispatchError::InvalidHeaders(format!(
                    "value of {} must be a string, number or boolean",
                    name
                )))
            }
        };
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DispatchError::InvalidHeaders(format!("invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|_| DispatchError::InvalidHeaders(format!("invalid value for {}", name)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Decode a response payload: JSON when possible, raw text otherwise
pub fn decode_payload(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Clears the busy flag when the dispatch ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends user requests and records them in history
pub struct Dispatcher {
    http: Client,
    history: HistoryClient,
    busy: AtomicBool,
}

impl Dispatcher {
    pub fn new(history: HistoryClient) -> Result<Self, DispatchError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            history,
            busy: AtomicBool::new(false),
        })
    }

    /// Check if a dispatch is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Send a request and record it.
    ///
    /// Validation and network failures are folded into the synthetic failure
    /// response; the only error is `Busy`, returned without side effects when
    /// another dispatch is still running.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DispatchError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let prepared = match prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::debug!("Rejected request before sending: {}", e);
                return Ok(failed_outcome(e));
            }
        };

        let response = match self.send(request, &prepared).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("{} {} failed: {}", request.method, request.url, e);
                return Ok(failed_outcome(e));
            }
        };

        let entry = NewLogEntry {
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            headers: prepared.header_json,
            body: prepared.body,
            response: response.data.clone(),
            status_code: i32::from(response.status),
        };

        let log = match self.history.create(&entry).await {
            Ok(created) => LogStatus::Recorded(created.id),
            Err(e) => {
                tracing::warn!("Failed to record request in history: {}", e);
                LogStatus::Failed(e.to_string())
            }
        };

        Ok(DispatchOutcome {
            response,
            log,
            failure: None,
        })
    }

    async fn send(
        &self,
        request: &DispatchRequest,
        prepared: &PreparedRequest,
    ) -> Result<DisplayResponse, DispatchError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .unwrap_or(reqwest::Method::GET);

        let mut builder = self
            .http
            .request(method, &request.url)
            .headers(prepared.headers.clone());

        if let Some(raw) = &prepared.raw_body {
            if !prepared.headers.contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            builder = builder.body(raw.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(DisplayResponse {
            status,
            data: decode_payload(&text),
        })
    }
}

fn failed_outcome(error: DispatchError) -> DispatchOutcome {
    DispatchOutcome {
        response: DisplayResponse::failed(),
        log: LogStatus::Skipped,
        failure: Some(error),
    }
}
