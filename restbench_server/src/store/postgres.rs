//! PostgreSQL request log store

use super::StoreError;
use chrono::{DateTime, Utc};
use restbench_common::{LogEntry, LogEntryPatch, NewLogEntry};
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

const TABLE: &str = "request_logs";

/// Entity columns after the primary key, with their DDL.
///
/// Both the table definition and the column backfill are generated from this
/// list, so adding a field here is the whole schema change.
const COLUMNS: &[(&str, &str)] = &[
    ("method", "TEXT NOT NULL DEFAULT ''"),
    ("url", "TEXT NOT NULL DEFAULT ''"),
    ("headers", "JSONB NOT NULL DEFAULT '{}'::jsonb"),
    ("body", "JSONB NULL"),
    ("response", "JSONB NOT NULL DEFAULT 'null'::jsonb"),
    ("status_code", "INTEGER NOT NULL DEFAULT 0"),
    ("created_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
];

const SELECT_COLUMNS: &str = "id, method, url, headers, body, response, status_code, created_at";

/// Row shape of `request_logs`
#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: i64,
    method: String,
    url: String,
    headers: Value,
    body: Option<Value>,
    response: Value,
    status_code: i32,
    created_at: DateTime<Utc>,
}

impl From<LogRow> for LogEntry {
    fn from(row: LogRow) -> Self {
        LogEntry {
            id: row.id,
            method: row.method,
            url: row.url,
            headers: row.headers,
            body: row.body,
            response: row.response,
            status_code: row.status_code,
            created_at: row.created_at,
        }
    }
}

fn create_table_sql() -> String {
    let columns: Vec<String> = COLUMNS
        .iter()
        .map(|(name, ddl)| format!("{} {}", name, ddl))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, {})",
        TABLE,
        columns.join(", ")
    )
}

fn add_column_sql(name: &str, ddl: &str) -> String {
    format!("ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}", TABLE, name, ddl)
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Initialize the database connection pool
    pub async fn connect(options: PgConnectOptions, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Create the table and add any columns missing from an older schema
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&create_table_sql()).execute(&self.pool).await?;

        for (name, ddl) in COLUMNS {
            sqlx::query(&add_column_sql(name, ddl))
                .execute(&self.pool)
                .await?;
        }

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {table}_created_at_idx ON {table} (created_at DESC, id DESC)",
            table = TABLE
        ))
        .execute(&self.pool)
        .await?;

        tracing::debug!("Schema for {} is up to date", TABLE);
        Ok(())
    }

    pub async fn insert(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        let row = sqlx::query_as::<_, LogRow>(&format!(
            r#"
            INSERT INTO {} (method, url, headers, body, response, status_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TABLE, SELECT_COLUMNS
        ))
        .bind(entry.method)
        .bind(entry.url)
        .bind(entry.headers)
        .bind(entry.body)
        .bind(entry.response)
        .bind(entry.status_code)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<LogEntry>, StoreError> {
        let row = sqlx::query_as::<_, LogRow>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            SELECT_COLUMNS, TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LogEntry::from))
    }

    pub async fn find_page(&self, offset: u64, limit: u64) -> Result<(Vec<LogEntry>, u64), StoreError> {
        let rows = sqlx::query_as::<_, LogRow>(&format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            SELECT_COLUMNS, TABLE
        ))
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(&self.pool)
        .await?;

        // Counted separately; may disagree with the slice under concurrent writes
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", TABLE))
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(LogEntry::from).collect(), total.max(0) as u64))
    }

    pub async fn update(&self, id: i64, patch: &LogEntryPatch) -> Result<Option<LogEntry>, StoreError> {
        let (set_body, body) = match &patch.body {
            Some(body) => (true, body.clone()),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, LogRow>(&format!(
            r#"
            UPDATE {} SET
                method = COALESCE($2::text, method),
                url = COALESCE($3::text, url),
                headers = COALESCE($4::jsonb, headers),
                body = CASE WHEN $5::boolean THEN $6::jsonb ELSE body END,
                response = COALESCE($7::jsonb, response),
                status_code = COALESCE($8::integer, status_code)
            WHERE id = $1
            RETURNING {}
            "#,
            TABLE, SELECT_COLUMNS
        ))
        .bind(id)
        .bind(patch.method.clone())
        .bind(patch.url.clone())
        .bind(patch.headers.clone())
        .bind(set_body)
        .bind(body)
        .bind(patch.response.clone())
        .bind(patch.status_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LogEntry::from))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
