//! Browse command

use anyhow::Result;
use restbench_cli::browser::HistoryBrowser;
use restbench_cli::config::Config;
use restbench_cli::history_client::HistoryClient;
use restbench_cli::tui::{self, BrowseApp};

/// Open the scrolling history view
pub async fn run(config: &Config) -> Result<()> {
    let client = HistoryClient::new(&config.server_url)?;
    let browser = HistoryBrowser::new(config.page_size);
    let app = BrowseApp::new(browser, client.base_url().to_string());
    tui::run(client, app).await
}
