//! planrev: interactive terminal reviewer for Markdown implementation plans.
//!
//! Entry point for the `planrev` binary. Wires together configuration
//! (`config`), logging (`logging`), the terminal lifecycle (`tui`), the event
//! bus (`event`), the controller (`app`), rendering (`ui`), and review output
//! (`output`).
//!
//! # Startup sequence
//!
//! 1. Logging, config, and CLI resolution. Fatal errors (missing
//!    `--output-path`, unreadable plan) surface here, before the terminal is
//!    touched.
//! 2. `install_panic_hook()` so a panic restores the terminal.
//! 3. `register_sigterm()`; the flag is polled on a 50 ms heartbeat.
//! 4. `init_tui()`, then `spawn_event_task()`.
//!
//! `restore_tui()` runs once after the loop. Inside the loop `?` is only used
//! on draw errors, which break out to the same restore path.

mod app;
mod comment_editor;
mod comment_list;
mod config;
mod detail;
mod event;
mod logging;
mod markdown;
mod output;
mod search_bar;
mod text_input;
mod theme;
mod tui;
mod ui;
mod wrap;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use planrev_core::parser::parse_bytes;
use planrev_core::review::format_review;
use planrev_core::types::Status;
use planrev_core::viewed::{state_path, ViewedState};

use crate::app::{App, AppOptions};
use crate::config::Config;
use crate::output::{OutputKind, SystemClipboard};
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Review a hierarchical Markdown plan step by step and send the comments
/// back to whoever wrote it.
#[derive(Debug, Parser)]
#[command(name = "planrev", version, about)]
struct Cli {
    /// Plan file to review.
    plan_file: PathBuf,

    /// Where to send the review [default: config, else clipboard].
    #[arg(long, value_enum)]
    output: Option<OutputKind>,

    /// File to write the review to with `--output file`.
    #[arg(long, value_name = "PATH")]
    output_path: Option<PathBuf>,

    /// Color theme [default: config, else dark].
    #[arg(long, value_parser = ["dark", "light"])]
    theme: Option<String>,

    /// Remember viewed steps in `<plan>.reviewed.json` between sessions.
    #[arg(long)]
    track_viewed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init();
    let cli = Cli::parse();
    let config = Config::load();

    let output = cli.output.or(config.output).unwrap_or_default();
    if output == OutputKind::File && cli.output_path.is_none() {
        bail!("--output-path is required with --output file");
    }
    let theme_name = cli
        .theme
        .as_deref()
        .or(config.theme.as_deref())
        .unwrap_or("dark");
    let theme = theme::Theme::from_name(theme_name);
    let track_viewed = cli.track_viewed || config.track_viewed;

    let raw = std::fs::read(&cli.plan_file)
        .with_context(|| format!("reading {}", cli.plan_file.display()))?;
    let plan = Arc::new(
        parse_bytes(&raw).with_context(|| format!("parsing {}", cli.plan_file.display()))?,
    );
    let file_path = cli.plan_file.display().to_string();
    tracing::info!(path = %file_path, steps = plan.len(), "plan loaded");

    let sidecar = state_path(&cli.plan_file);
    let viewed_state = track_viewed.then(|| ViewedState::load(&sidecar));

    let mut app = App::new(
        Arc::clone(&plan),
        &theme,
        AppOptions {
            file_path: file_path.clone(),
            viewed_state,
            left_ratio: Some(config.left_ratio()),
        },
    );

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm().context("registering SIGTERM handler")?;
    let mut terminal = tui::init_tui().context("initialising terminal")?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let loop_result = run(&mut terminal, &mut app, &theme, &mut rx, &term_flag).await;

    tui::restore_tui().context("restoring terminal")?;
    loop_result?;

    if let Some(state) = app.step_list.viewed_state() {
        if let Err(e) = state.save(&sidecar) {
            tracing::warn!(error = %e, "saving viewed state failed");
            eprintln!("planrev: {e}");
        }
    }

    let result = app.result();
    match result.status {
        Status::Submitted => {
            let review = format_review(result, &plan, &file_path);
            output::write_review(
                &review,
                output,
                cli.output_path.as_deref(),
                &mut SystemClipboard,
                &mut std::io::stdout(),
                &mut std::io::stderr(),
            )?;
        }
        Status::Approved => eprintln!("Plan approved."),
        Status::Cancelled => tracing::info!("review cancelled"),
    }
    Ok(())
}

/// Drives the event loop until the user quits, SIGTERM arrives, or the input
/// stream ends. Redraws after every handled event.
async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    theme: &theme::Theme,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<event::AppEvent>,
    term_flag: &std::sync::atomic::AtomicBool,
) -> anyhow::Result<()> {
    terminal.draw(|frame| ui::render(frame, app, theme))?;

    loop {
        tokio::select! {
            // Heartbeat: a quiet terminal would otherwise block in recv()
            // and never look at the SIGTERM flag.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    tracing::info!("SIGTERM received");
                    app.cancel();
                    return Ok(());
                }
            }
            maybe_event = rx.recv() => {
                let action = match maybe_event {
                    Some(event::AppEvent::Key(key)) => handle_key(key, app),
                    Some(event::AppEvent::Mouse(mouse)) => handle_mouse(mouse, app),
                    Some(event::AppEvent::Resize(_, _)) => KeyAction::Continue,
                    Some(event::AppEvent::Quit) | None => KeyAction::Quit,
                };
                if action == KeyAction::Quit {
                    return Ok(());
                }
                terminal.draw(|frame| ui::render(frame, app, theme))?;
            }
        }
    }
}
