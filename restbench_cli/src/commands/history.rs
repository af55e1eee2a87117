//! History commands (history, show, update, delete)

use anyhow::{Context, Result};
use console::style;
use restbench_cli::config::Config;
use restbench_cli::history_client::{ClientError, HistoryClient};
use restbench_common::{HttpVerb, LogEntry, LogEntryPatch, PageRequest};

/// List one page of history
pub async fn list(config: &Config, page: u32, limit: Option<u32>) -> Result<()> {
    let client = HistoryClient::new(&config.server_url)?;
    let request = PageRequest::new(page, limit.unwrap_or(config.page_size));

    let history = client
        .list(request)
        .await
        .context("Failed to fetch history")?;

    if history.data.is_empty() {
        if history.total == 0 {
            println!("No requests recorded yet.");
            println!();
            println!("Send one with: restbench send GET <URL>");
        } else {
            println!(
                "Page {} is empty ({} requests recorded).",
                request.page, history.total
            );
        }
        return Ok(());
    }

    // Print header
    println!(
        "{:<8} {:<8} {:<50} {:<7} {:<16}",
        "ID", "METHOD", "URL", "STATUS", "CREATED"
    );
    println!("{}", "-".repeat(92));

    for entry in &history.data {
        println!(
            "{:<8} {:<8} {:<50} {:<7} {:<16}",
            entry.id,
            entry.method,
            truncate(&entry.url, 48),
            entry.status_code,
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    let shown = u64::from(request.page - 1) * u64::from(request.limit) + history.data.len() as u64;
    println!();
    println!(
        "{}",
        style(format!(
            "Page {} ({} of {} requests)",
            request.page,
            shown.min(history.total),
            history.total
        ))
        .dim()
    );
    if shown < history.total {
        println!(
            "{}",
            style(format!("Next: restbench history --page {}", request.page + 1)).dim()
        );
    }

    Ok(())
}

/// Show a single entry
pub async fn show(config: &Config, id: i64) -> Result<()> {
    let client = HistoryClient::new(&config.server_url)?;
    let entry = client.get(id).await.map_err(|e| not_found(e, id))?;
    print_entry(&entry);
    Ok(())
}

/// Overwrite selected fields of an entry
pub async fn update(
    config: &Config,
    id: i64,
    status: Option<i32>,
    url: Option<String>,
    method: Option<HttpVerb>,
) -> Result<()> {
    let patch = LogEntryPatch {
        status_code: status,
        url,
        method: method.map(|m| m.as_str().to_string()),
        ..Default::default()
    };

    if patch.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one of --status, --url or --method.");
    }

    let client = HistoryClient::new(&config.server_url)?;
    let entry = client.update(id, &patch).await.map_err(|e| not_found(e, id))?;

    println!("Updated #{}", entry.id);
    println!();
    print_entry(&entry);
    Ok(())
}

/// Delete an entry
pub async fn delete(config: &Config, id: i64) -> Result<()> {
    let client = HistoryClient::new(&config.server_url)?;
    client.delete(id).await.map_err(|e| not_found(e, id))?;
    println!("Deleted #{}", id);
    Ok(())
}

fn not_found(error: ClientError, id: i64) -> anyhow::Error {
    match error {
        ClientError::NotFound => anyhow::anyhow!("History entry not found: {}", id),
        other => other.into(),
    }
}

fn print_entry(entry: &LogEntry) {
    println!("{} {}", style(&entry.method).bold(), entry.url);
    println!("Status:  {}", entry.status_code);
    println!("Created: {}", entry.created_at.to_rfc3339());

    println!();
    println!("{}", style("Headers").bold());
    println!("{}", pretty(&entry.headers));

    if let Some(body) = &entry.body {
        println!();
        println!("{}", style("Body").bold());
        println!("{}", pretty(body));
    }

    println!();
    println!("{}", style("Response").bold());
    println!("{}", pretty(&entry.response));
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
