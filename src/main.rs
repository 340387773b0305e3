//! CheeChat CLI - terminal client for the CheeChat messaging backend
//!
//! One-shot commands for the account and chats, plus a full-screen TUI.

mod api;
mod auth;
mod config;
mod models;
mod panel;
mod tui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use models::Registration;

#[derive(Parser)]
#[command(name = "cheechat")]
#[command(about = "Terminal client for CheeChat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides config and CHEECHAT_URL)
    #[arg(long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session cookie
    Login {
        username: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Log out and forget the session
    Logout,

    /// Show whether a session cookie is stored
    Status,

    /// Show the current user's id
    Whoami,

    /// List your chats
    Chats {
        /// Maximum number of chats to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Look up a user by exact username
    Search { username: String },

    /// Open (creating if needed) the chat with a user
    Open { username: String },

    /// Open an existing chat by id
    Chat { chat_id: i64 },

    /// Launch the terminal user interface
    Tui,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into())
    };

    // The TUI owns the terminal, so its logs go to the in-app pane.
    let log_buffer = tui::LogBuffer::new();
    if matches!(cli.command, Commands::Tui) {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(log_buffer.clone()),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }

    let mut config = Config::load()?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    tracing::debug!("Using backend {}", config.base_url());

    match cli.command {
        Commands::Login { username, password } => {
            auth::login(&config, username, password).await?;
        }
        Commands::Register {
            email,
            first_name,
            last_name,
            username,
            password,
        } => {
            let registration = Registration {
                email,
                first_name,
                last_name,
                username,
                password,
            };
            auth::register(&config, registration).await?;
        }
        Commands::Logout => {
            auth::logout(&config).await?;
        }
        Commands::Status => {
            auth::status(&config).await?;
        }
        Commands::Whoami => {
            api::whoami(&config).await?;
        }
        Commands::Chats { limit } => {
            tracing::info!("Fetching chats...");
            api::list_chats(&config, limit).await?;
        }
        Commands::Search { username } => {
            api::search(&config, &username).await?;
        }
        Commands::Open { username } => {
            api::open_chat(&config, &username).await?;
        }
        Commands::Chat { chat_id } => {
            api::open_chat_by_id(&config, chat_id).await?;
        }
        Commands::Tui => {
            tui::run(config, log_buffer).await?;
        }
    }

    Ok(())
}
