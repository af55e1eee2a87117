//! Terminal history browser

mod app;
mod ui;

pub use app::{BrowseApp, View};
pub use ui::{draw, method_color, status_color};

use crate::history_client::HistoryClient;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

/// Run the browser until the user quits
pub async fn run(client: HistoryClient, mut app: BrowseApp) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &client, &mut app).await;
    ratatui::restore();
    result
}

async fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    client: &HistoryClient,
    app: &mut BrowseApp,
) -> Result<()> {
    // Set after a failed load; the page stays pending until the user retries
    let mut paused = false;

    while !app.should_quit {
        if !paused && app.browser.needs_load() {
            terminal.draw(|frame| draw(frame, app))?;
            match app.browser.load_page(client).await {
                Ok(added) => {
                    tracing::debug!("Loaded {} history entries", added);
                    app.status = None;
                }
                Err(e) => {
                    app.status = Some(format!("{} (r to retry)", e));
                    paused = true;
                }
            }
        }

        terminal.draw(|frame| draw(frame, app))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if paused && key.code == KeyCode::Char('r') {
                paused = false;
                continue;
            }
            app.handle_key(key);
        }
    }
    Ok(())
}
