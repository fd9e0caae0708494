use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use resume_analyzer_core::{Config, HttpGateway, SessionIdentity};

mod app;
mod commands;
mod handler;
mod logging;
mod picker;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "resume-analyzer")]
#[command(about = "Upload resumes and chat with an assistant grounded in them")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "RESUME_ANALYZER_BACKEND_URL")]
    backend_url: Option<String>,

    /// Alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive upload and chat (default)
    Tui,
    /// Upload documents to the current session
    Upload {
        /// Files to upload (.pdf or .txt)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask one question about the uploaded documents
    Ask {
        /// Your question
        message: String,
    },
    /// Print the current session id
    Session {
        /// Discard the current session and start a new one
        #[arg(long)]
        reset: bool,
    },
    /// Check that the backend is reachable
    Health,
    /// Show the effective settings
    Config {
        /// Write the effective backend URL to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI needs the terminal, so its logs go to a file
    let _guard = match command {
        Commands::Tui => Some(logging::init_file_logging()?),
        _ => {
            logging::init_stderr_logging()?;
            None
        }
    };

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config: {e:#}");
            Config::new()
        }),
    };

    let backend_url = cli.backend_url.unwrap_or_else(|| config.backend_url());
    let gateway = Arc::new(HttpGateway::new(&backend_url));
    let mut session = if cli.ephemeral {
        SessionIdentity::in_memory()
    } else {
        SessionIdentity::new(config.session_store()?)
    };

    let ok = match command {
        Commands::Tui => {
            run_tui(session, gateway, backend_url).await?;
            true
        }
        Commands::Upload { files } => {
            commands::upload_files(&mut session, gateway.as_ref(), files).await?
        }
        Commands::Ask { message } => commands::ask(&mut session, gateway.as_ref(), &message).await?,
        Commands::Session { reset } => commands::show_session(&mut session, reset)?,
        Commands::Health => commands::check_health(gateway.as_ref(), &backend_url).await?,
        Commands::Config { save } => {
            commands::show_config(&mut config, &backend_url, cli.config.as_deref(), save)?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run_tui(session: SessionIdentity, gateway: Arc<HttpGateway>, backend_url: String) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(session, gateway, backend_url, events.sender());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        anyhow::Ok(())
    }
    .await;

    app.abort_tasks();
    tui::restore()?;
    tracing::info!("Client exited");
    result
}
