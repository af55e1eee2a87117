//! Config command

use anyhow::Result;
use console::style;
use restbench_cli::config::{config_file, Config};

/// Print the effective config, or save a new server URL
pub fn run(mut config: Config, set_server: Option<String>) -> Result<()> {
    if let Some(url) = set_server {
        config.server_url = url.trim_end_matches('/').to_string();
        config.save()?;
        println!(
            "{} history server set to {}",
            style("✓").green(),
            config.server_url
        );
        return Ok(());
    }

    println!("Config file: {}", config_file().display());
    println!("Server:      {}", config.server_url);
    println!("Page size:   {}", config.page_size);
    Ok(())
}
