//! CLI command implementations

pub mod browse;
pub mod config;
pub mod history;
pub mod send;
