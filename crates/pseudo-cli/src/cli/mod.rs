//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pseudo_core::api::ApiClient;
use pseudo_core::config::{self, SERVER_URL_ENV};
use pseudo_core::logging::{self, LogTarget};

mod commands;

#[derive(Parser)]
#[command(name = "pseudo")]
#[command(version)]
#[command(about = "Terminal chat client with response variations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Open an existing chat by ID
    #[arg(long, value_name = "ID")]
    chat: Option<String>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, value_name = "URL", env = SERVER_URL_ENV)]
    server: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sends one message and prints the reply
    Exec {
        /// The message to send
        #[arg(short, long)]
        prompt: String,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Continue an existing chat by ID
        #[arg(long, value_name = "ID")]
        chat: Option<String>,
    },

    /// Manage saved chats
    Chats {
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// Lists selectable models
    Models,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ChatCommands {
    /// Lists saved chats, newest first
    List,
    /// Shows a saved chat
    Show {
        /// The ID of the chat to show
        #[arg(value_name = "CHAT_ID")]
        id: String,

        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deletes a saved chat
    Delete {
        /// The ID of the chat to delete
        #[arg(value_name = "CHAT_ID")]
        id: String,
    },
    /// Creates an empty chat and prints its ID
    New,
    /// Downloads an image or audio file stored with a chat
    Media {
        /// The ID of the chat that owns the file
        #[arg(value_name = "CHAT_ID")]
        id: String,

        /// File name inside the chat's media directory
        #[arg(value_name = "FILE")]
        file: String,

        /// Output file or directory (default: the configured download directory)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    let target = if cli.command.is_none() {
        LogTarget::File
    } else {
        LogTarget::Stderr
    };
    let _log_guard = logging::init(&config, target)?;

    let Cli {
        command,
        chat,
        server,
    } = cli;

    let client = || -> Result<ApiClient> {
        match server.as_deref() {
            Some(url) => ApiClient::new(url, config.request_timeout()),
            None => ApiClient::from_config(&config),
        }
    };

    // default to chat mode
    let Some(command) = command else {
        return commands::chat::run(&config, client()?, chat).await;
    };

    match command {
        Commands::Exec {
            prompt,
            model,
            chat,
        } => {
            commands::exec::run(commands::exec::ExecRunOptions {
                client: client()?,
                config: &config,
                prompt: &prompt,
                model_override: model.as_deref(),
                chat_id: chat.as_deref(),
            })
            .await
        }

        Commands::Chats { command } => {
            let client = client()?;
            match command {
                ChatCommands::List => commands::chats::list(&client).await,
                ChatCommands::Show { id, json } => commands::chats::show(&client, &id, json).await,
                ChatCommands::Delete { id } => commands::chats::delete(&client, &id).await,
                ChatCommands::New => commands::chats::create(&client).await,
                ChatCommands::Media { id, file, output } => {
                    commands::chats::media(&client, &config, id, file, output).await
                }
            }
        }

        Commands::Models => commands::models::list(&client()?).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
