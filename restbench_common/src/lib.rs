//! Restbench Common - Shared history types for the REST client
//!
//! This crate contains the request-log record and the payloads exchanged
//! between the history server and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Path prefix the history CRUD surface is mounted under
pub const HISTORY_PATH: &str = "/history";

/// Pagination defaults and bounds
pub mod pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;
}

/// Error parsing an HTTP verb
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported HTTP method: {0}")]
pub struct ParseVerbError(pub String);

/// HTTP verbs the client can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 4] = [HttpVerb::Get, HttpVerb::Post, HttpVerb::Put, HttpVerb::Delete];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
        }
    }

    /// Whether a request body is sent for this verb
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpVerb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseVerbError(s.to_string()))
    }
}

/// One logged request and the response it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub method: String,
    pub url: String,
    pub headers: Value,
    #[serde(default)]
    pub body: Option<Value>,
    pub response: Value,
    pub status_code: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a log entry.
///
/// `id` and `createdAt` are assigned by the store; if a client sends them
/// they are dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLogEntry {
    pub method: String,
    pub url: String,
    #[serde(default = "empty_object")]
    pub headers: Value,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub response: Value,
    pub status_code: i32,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl NewLogEntry {
    /// Entry with empty headers, no body and a null response
    pub fn new(method: impl Into<String>, url: impl Into<String>, status_code: i32) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: empty_object(),
            body: None,
            response: Value::Null,
            status_code,
        }
    }
}

/// Partial update of a log entry. Absent fields are left unchanged.
///
/// `body` is nullable, so it distinguishes a missing key (`None`) from an
/// explicit `null` (`Some(None)`), which clears it. An explicit `null` for
/// `headers` or `response` is stored as the JSON value `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub headers: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub body: Option<Option<Value>>,
    #[serde(
        default,
        deserialize_with = "null_as_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i32>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

fn null_as_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl LogEntryPatch {
    /// Check if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge the supplied fields into an entry, leaving `id` and `created_at` untouched
    pub fn apply_to(&self, entry: &mut LogEntry) {
        if let Some(method) = &self.method {
            entry.method = method.clone();
        }
        if let Some(url) = &self.url {
            entry.url = url.clone();
        }
        if let Some(headers) = &self.headers {
            entry.headers = headers.clone();
        }
        if let Some(body) = &self.body {
            entry.body = body.clone();
        }
        if let Some(response) = &self.response {
            entry.response = response.clone();
        }
        if let Some(status_code) = self.status_code {
            entry.status_code = status_code;
        }
    }
}

/// One page of history plus the total number of stored entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub data: Vec<LogEntry>,
    pub total: u64,
}

/// Error payload returned by the history server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Payload returned after a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Validated pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: pagination::DEFAULT_PAGE,
            limit: pagination::DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Clamp to `page >= 1` and `1 <= limit <= MAX_LIMIT`
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, pagination::MAX_LIMIT),
        }
    }

    /// Build from raw query values. Missing or non-numeric values fall back
    /// to the defaults; negative or out-of-range values are clamped.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: u32| -> u32 {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .map(|n| n.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(default)
        };
        Self::new(
            parse(page, pagination::DEFAULT_PAGE),
            parse(limit, pagination::DEFAULT_LIMIT),
        )
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}
