//! History browser TUI state and key handling

use crate::browser::HistoryBrowser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use restbench_common::LogEntry;

/// TUI view modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

/// TUI application state
pub struct BrowseApp {
    pub browser: HistoryBrowser,
    pub server_url: String,
    pub view: View,
    pub selected_index: usize,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl BrowseApp {
    pub fn new(browser: HistoryBrowser, server_url: String) -> Self {
        Self {
            browser,
            server_url,
            view: View::List,
            selected_index: 0,
            status: None,
            should_quit: false,
        }
    }

    pub fn selected(&self) -> Option<&LogEntry> {
        self.browser.entries().get(self.selected_index)
    }

    fn last_index(&self) -> usize {
        self.browser.entries().len().saturating_sub(1)
    }

    fn select(&mut self, index: usize) {
        self.selected_index = index.min(self.last_index());
        if self.browser.on_scroll(self.selected_index) {
            tracing::debug!("Requesting history page {}", self.browser.page());
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            // Quit
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                self.should_quit = true;
            }
            // Toggle detail view
            (KeyCode::Enter, _) if self.selected().is_some() => {
                self.view = match self.view {
                    View::List => View::Detail,
                    View::Detail => View::List,
                };
            }
            (KeyCode::Esc, _) => {
                self.view = View::List;
            }
            // Navigation
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                self.select(self.selected_index.saturating_sub(1));
            }
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                self.select(self.selected_index + 1);
            }
            (KeyCode::PageUp, _) => {
                self.select(self.selected_index.saturating_sub(10));
            }
            (KeyCode::PageDown, _) => {
                self.select(self.selected_index + 10);
            }
            (KeyCode::Home, _) => {
                self.select(0);
            }
            (KeyCode::End, _) => {
                self.select(self.last_index());
            }
            _ => {}
        }
    }
}
