//! Restbench client library
//!
//! The pieces behind the `restbench` binary: the request dispatcher, the
//! history server client, the incremental history browser and its TUI.

pub mod browser;
pub mod config;
pub mod dispatch;
pub mod history_client;
pub mod tui;

pub use browser::HistoryBrowser;
pub use dispatch::{DispatchError, DispatchOutcome, DispatchRequest, Dispatcher, DisplayResponse, LogStatus};
pub use history_client::{ClientError, HistoryClient};
