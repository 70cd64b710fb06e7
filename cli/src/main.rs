//! Parley CLI - Binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI wires [`parley_engine`] (turn controller and UI state) to
//! [`parley_tui`] (rendering) and owns the terminal through an RAII guard.
//!
//! ```text
//! main() -> TerminalSession::new() -> run_app() -> App + TurnController + TUI
//! ```
//!
//! # Event Loop
//!
//! A fixed 8ms render cadence races the in-flight turn futures:
//!
//! 1. Wait for a frame tick or a turn to finish
//! 2. Drain input queue (non-blocking via [`parley_tui::InputPump`])
//! 3. Start a turn future for each queued submission
//! 4. Advance notices and animations (`app.tick()`)
//! 5. Apply render events from the controller
//! 6. Render frame
//!
//! Turn futures are polled on this task, so controller steps never interleave
//! with input handling or drawing.

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use ratatui::prelude::*;
use std::{
    fs::{self, OpenOptions},
    io::{Stdout, Write, stdout},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use parley_config::{CredentialStore, FileCredentialStore, ParleyConfig};
use parley_engine::{App, AppOptions, InputGate, RenderSink, TurnController};
use parley_providers::{GeminiClient, Transport};
use parley_tui::{InputPump, draw, handle_events};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_parley_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: prefer no logs over writing into the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_parley_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in parley_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn parley_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.parley/logs/parley.log
    if let Some(home) = parley_config::parley_home() {
        candidates.push(home.join("logs").join("parley.log"));
    }

    // Fallback: ./.parley/logs/parley.log
    candidates.push(
        parley_config::local_parley_dir()
            .join("logs")
            .join("parley.log"),
    );

    candidates
}

fn load_config() -> ParleyConfig {
    match ParleyConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(path = %e.path().display(), "Using default config: {e}");
            ParleyConfig::default()
        }
    }
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Enables raw mode, bracketed paste, the alternate screen and alternate scroll
/// mode (scroll wheel as Up/Down without mouse capture). Everything is restored
/// on drop, including after a panic or early return.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnableBracketedPaste, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }
        // Alternate scroll mode: CSI ? 1007 h
        let _ = out.write_all(b"\x1b[?1007h");
        let _ = out.flush();

        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = disable_raw_mode();
                let mut out = stdout();
                let _ = out.write_all(b"\x1b[?1007l");
                let _ = out.flush();
                let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
                Err(err.into())
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        // Alternate scroll mode off: CSI ? 1007 l
        let _ = self.terminal.backend_mut().write_all(b"\x1b[?1007l");
        let _ = std::io::Write::flush(&mut *self.terminal.backend_mut());
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::at_default_location());
    let transport = GeminiClient::new(config.base_url(), config.model())
        .context("invalid Gemini endpoint in config")?;
    tracing::info!(
        model = config.model(),
        timeout_ms = config.request_timeout().as_millis() as u64,
        "Starting"
    );

    let mut app = App::new(
        Arc::clone(&credentials),
        AppOptions {
            ascii_only: config.ascii_only(),
            model: config.model().to_string(),
        },
    );
    let controller = TurnController::new(transport, credentials, app.sink(), app.gate())
        .with_timeout(config.request_timeout());

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app, &controller).await
    };

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    Ok(())
}

const FRAME_DURATION: Duration = Duration::from_millis(8);

async fn run_app<B, T, S, G>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    controller: &TurnController<T, S, G>,
) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
    T: Transport,
    S: RenderSink,
    G: InputGate,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut turns = FuturesUnordered::new();

    let result: Result<()> = loop {
        tokio::select! {
            _ = frames.tick() => {}
            Some(report) = turns.next(), if !turns.is_empty() => {
                if let Some(report) = report {
                    tracing::debug!(?report, "Turn report");
                }
            }
        }

        // Non-blocking input (drain queue only)
        let quit_now = match handle_events(app, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        for text in app.take_submissions() {
            turns.push(async move { controller.submit(&text).await });
        }

        app.tick(Instant::now());
        app.process_view_events();

        if let Err(e) = terminal.draw(|frame| draw(frame, app)) {
            break Err(e.into());
        }
    };

    if !turns.is_empty() {
        tracing::info!(in_flight = turns.len(), "Dropping in-flight turn on exit");
    }
    drop(turns);
    input.shutdown().await;
    result
}
