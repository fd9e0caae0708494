//! One-shot subcommands that run a single operation and print the result.

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::*;
use resume_analyzer_core::{
    BackendGateway, Config, ConversationController, SessionIdentity, TurnState,
    UploadCoordinator,
};

pub async fn upload_files(
    session: &mut SessionIdentity,
    gateway: &dyn BackendGateway,
    files: Vec<PathBuf>,
) -> Result<bool> {
    let mut upload = UploadCoordinator::new();
    let requested = files.len();
    let kept = upload.select_files(files);

    if kept < requested {
        println!(
            "{}",
            format!("Skipping {} path(s) that are not regular files", requested - kept).yellow()
        );
    }
    if kept == 0 {
        println!("{}", "No files to upload".red());
        return Ok(false);
    }

    let token = session.get_session_id();
    println!(
        "📤 Uploading {} to session {}",
        upload.selected_summary().bold(),
        token.short().cyan()
    );
    upload.submit(gateway, &token).await;

    let status = upload.status().unwrap_or_default();
    if upload.last_outcome().is_some() {
        println!("{}", status.green());
        Ok(true)
    } else {
        println!("{} {}", "✘".red(), status);
        Ok(false)
    }
}

pub async fn ask(
    session: &mut SessionIdentity,
    gateway: &dyn BackendGateway,
    message: &str,
) -> Result<bool> {
    let mut chat = ConversationController::new();
    let token = session.get_session_id();

    if !chat.submit(message, gateway, &token).await {
        println!("{}", "Nothing to ask: the message is empty".yellow());
        return Ok(false);
    }

    match chat.turns().last().map(|turn| &turn.state) {
        Some(TurnState::Resolved(answer)) => {
            println!("{}", "Answer:".bold().green());
            println!("{}", answer);
            Ok(true)
        }
        Some(TurnState::Failed(message)) => {
            println!("{}: {}", "Error".red(), message);
            println!("Make sure the backend is reachable and try again.");
            Ok(false)
        }
        _ => Ok(false),
    }
}

pub fn show_session(session: &mut SessionIdentity, reset: bool) -> Result<bool> {
    if reset {
        let old = session.get_session_id();
        session.reset_session_id();
        println!("{} {}", "Discarded session".yellow(), old.to_string().dimmed());
    }
    println!("{}", session.get_session_id().to_string().bold());
    Ok(true)
}

pub async fn check_health(gateway: &dyn BackendGateway, backend_url: &str) -> Result<bool> {
    match gateway.health().await {
        Ok(()) => {
            println!("{} {}", "✔".green(), format!("{} is up", backend_url).bold());
            Ok(true)
        }
        Err(e) => {
            println!("{} {}: {}", "✘".red(), backend_url.bold(), e);
            Ok(false)
        }
    }
}

/// Print the effective backend URL and, with `save`, persist it to `path`
/// (or the default config location).
pub fn show_config(
    config: &mut Config,
    backend_url: &str,
    path: Option<&Path>,
    save: bool,
) -> Result<bool> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::get_config_path()?,
    };

    if save {
        config.backend_url = Some(backend_url.to_string());
        match path {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        println!("{} {}", "Saved".green(), config_path.display());
    }

    println!("{} {}", "Config file:".bold(), config_path.display());
    println!("{} {}", "Backend URL:".bold(), backend_url);
    if let Some(session_file) = &config.session_file {
        println!("{} {}", "Session file:".bold(), session_file.display());
    }
    Ok(true)
}
