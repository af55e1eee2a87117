//! Send command

use anyhow::Result;
use console::style;
use restbench_cli::config::Config;
use restbench_cli::dispatch::{DispatchRequest, Dispatcher, DisplayResponse, LogStatus};
use restbench_cli::history_client::HistoryClient;
use restbench_common::HttpVerb;

pub struct SendOptions {
    pub method: HttpVerb,
    pub url: String,
    pub headers: String,
    pub body: String,
}

/// Send one request, print the response and report whether it was recorded
pub async fn run(config: &Config, opts: SendOptions) -> Result<()> {
    let history = HistoryClient::new(&config.server_url)?;
    let dispatcher = Dispatcher::new(history)?;

    let request = DispatchRequest {
        method: opts.method,
        url: opts.url,
        headers: opts.headers,
        body: opts.body,
    };

    let outcome = dispatcher.dispatch(&request).await?;

    if let Some(reason) = &outcome.failure {
        eprintln!("{} {}", style("error:").red().bold(), reason);
    }

    print_response(&outcome.response);

    match outcome.log {
        LogStatus::Recorded(id) => {
            println!();
            println!("{}", style(format!("Saved to history as #{}", id)).dim());
        }
        LogStatus::Failed(message) => {
            eprintln!();
            eprintln!(
                "{} request was not saved to history: {}",
                style("warning:").yellow().bold(),
                message
            );
        }
        LogStatus::Skipped => {}
    }

    Ok(())
}

fn print_response(response: &DisplayResponse) {
    let status = if response.is_success() {
        style(response.status.to_string()).green().bold()
    } else {
        style(response.status.to_string()).red().bold()
    };
    println!("Status: {}", status);
    println!();

    match &response.data {
        serde_json::Value::String(text) => println!("{}", text),
        data => println!(
            "{}",
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
        ),
    }
}
