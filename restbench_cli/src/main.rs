//! Restbench CLI - Send HTTP requests and browse their history
//!
//! Usage:
//!   restbench send <METHOD> <URL>     Send a request and record it
//!   restbench history                 List recorded requests
//!   restbench show <ID>               Show one recorded request
//!   restbench update <ID>             Edit a recorded request
//!   restbench delete <ID>             Delete a recorded request
//!   restbench browse                  Scroll through history interactively
//!   restbench config                  Show or change CLI settings

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use restbench_cli::config::Config;
use restbench_common::HttpVerb;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "restbench")]
#[command(author = "Restbench Team")]
#[command(version)]
#[command(about = "Send HTTP requests and keep a browsable history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// History server URL (overrides the config file)
    #[arg(long, global = true, env = "RESTBENCH_SERVER")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request and record it in history
    Send {
        /// HTTP method (GET, POST, PUT or DELETE)
        method: HttpVerb,

        /// Target URL
        url: String,

        /// Headers as a JSON object
        #[arg(short = 'H', long, default_value = "{}")]
        headers: String,

        /// JSON body (POST and PUT only)
        #[arg(short = 'd', long, default_value = "")]
        data: String,
    },

    /// List recorded requests, newest first
    History {
        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Entries per page (defaults to the configured page size)
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one recorded request
    Show {
        /// History entry ID
        id: i64,
    },

    /// Edit fields of a recorded request
    Update {
        /// History entry ID
        id: i64,

        /// New status code
        #[arg(long)]
        status: Option<i32>,

        /// New URL
        #[arg(long)]
        url: Option<String>,

        /// New method
        #[arg(long)]
        method: Option<HttpVerb>,
    },

    /// Delete a recorded request
    Delete {
        /// History entry ID
        id: i64,
    },

    /// Browse history in a scrolling terminal view
    Browse,

    /// Show the CLI configuration, or save a new server URL
    Config {
        /// History server URL to save
        #[arg(long = "set-server")]
        set_server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},restbench_cli=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = Config::load()?.with_server_override(cli.server);
    tracing::debug!("Using history server {}", config.server_url);

    // Handle commands
    match cli.command {
        Commands::Send {
            method,
            url,
            headers,
            data,
        } => {
            let opts = commands::send::SendOptions {
                method,
                url,
                headers,
                body: data,
            };
            commands::send::run(&config, opts).await?;
        }

        Commands::History { page, limit } => {
            commands::history::list(&config, page, limit).await?;
        }

        Commands::Show { id } => {
            commands::history::show(&config, id).await?;
        }

        Commands::Update {
            id,
            status,
            url,
            method,
        } => {
            commands::history::update(&config, id, status, url, method).await?;
        }

        Commands::Delete { id } => {
            commands::history::delete(&config, id).await?;
        }

        Commands::Browse => {
            commands::browse::run(&config).await?;
        }

        Commands::Config { set_server } => {
            commands::config::run(config, set_server)?;
        }
    }

    Ok(())
}
