//! bookcal-provider-google - Google Calendar provider for bookcal
//!
//! This binary implements the bookcal provider protocol, communicating
//! with bookcal via JSON over stdin/stdout. Logs go to stderr.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/bookcal/providers/google/app_config.toml
//!   ~/.config/bookcal/providers/google/session/{account}.toml

mod app_config;
mod commands;
mod errors;
mod remote_config;
mod session;
mod to_google;

use std::future::Future;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use bookcal_core::provider::protocol::{Command, ErrorKind, Request, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::<()>::error(
                ErrorKind::Rejected,
                &format!("Failed to parse request: {}", e),
            ),
        };

        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }

    Ok(())
}

async fn handle_request(request: Request) -> String {
    tracing::debug!(command = ?request.command, "Handling request");

    match request.command {
        Command::Authenticate => {
            dispatch(request.params, ErrorKind::Auth, commands::authenticate::handle).await
        }
        Command::FindCalendar => {
            dispatch(request.params, ErrorKind::Transport, commands::find_calendar::handle).await
        }
        Command::CreateEvent => {
            dispatch(request.params, ErrorKind::Transport, commands::create_event::handle).await
        }
        Command::FindEvent => {
            dispatch(request.params, ErrorKind::Transport, commands::find_event::handle).await
        }
        Command::UpdateEvent => {
            dispatch(request.params, ErrorKind::Transport, commands::update_event::handle).await
        }
        Command::DeleteEvent => {
            dispatch(request.params, ErrorKind::Transport, commands::delete_event::handle).await
        }
    }
}

/// Parses the params into the command type, runs it and renders the response.
/// Failures with no recognizable cause are reported as `fallback`.
async fn dispatch<C, T, F, Fut>(params: serde_json::Value, fallback: ErrorKind, handler: F) -> String
where
    C: DeserializeOwned,
    T: Serialize,
    F: FnOnce(C) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let cmd: C = match serde_json::from_value(params) {
        Ok(cmd) => cmd,
        Err(e) => return Response::<()>::error(ErrorKind::Rejected, &format!("Invalid params: {}", e)),
    };

    match handler(cmd).await {
        Ok(data) => Response::success(data),
        Err(e) => {
            let kind = errors::classify(&e).unwrap_or(fallback);
            tracing::warn!(?kind, "{:#}", e);
            Response::<()>::error(kind, &format!("{:#}", e))
        }
    }
}
