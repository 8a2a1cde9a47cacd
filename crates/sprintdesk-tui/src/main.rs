//! sprintdesk - a terminal client for a project-management backend.
//!
//! Browse projects, sprints and tasks, accept project invitations, and keep
//! the login session alive while you work.

mod app;
mod cli;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sprintdesk_core::api::ApiClient;
use sprintdesk_core::auth::{CredentialStore, SessionContext, SystemClock};
use sprintdesk_core::config::Config;
use sprintdesk_core::router::Route;

use app::App;
use ui::input::{is_interrupt, to_input};
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize file logging. The terminal belongs to the UI, so nothing goes
/// to stderr. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "sprintdesk.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let data_dir = config.data_dir()?;
    let _log_guard = match init_tracing(&config.log_dir()?) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled ({})", e);
            None
        }
    };
    info!("sprintdesk starting");
    if let Some(e) = config_error {
        warn!(error = %e, "Could not load config, using defaults");
    }

    let client = Arc::new(ApiClient::new(config.api_base_url())?);
    let store = Arc::new(CredentialStore::open(&data_dir));
    let session = SessionContext::new(store, client.clone(), Arc::new(SystemClock));
    let config = config.into_shared();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--logout") => {
            cli::logout(&session);
            return Ok(());
        }
        Some("--login") => {
            if let Err(e) = cli::login_interactive(&session, &config).await {
                eprintln!("Login failed: {}", e);
                std::process::exit(1);
            }
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown argument: {}", other);
            eprintln!("Usage: sprintdesk [--login | --logout]");
            std::process::exit(2);
        }
        None => {}
    }

    if session.needs_refresh() {
        if let Err(e) = session.refresh().await {
            warn!(error = %e, "Startup refresh failed");
        }
    }
    let initial = if session.is_token_valid() {
        Route::Projects
    } else {
        Route::Home
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, session, client.clone(), client, initial);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;
    drop(app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("sprintdesk shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        if app.take_redraw() {
            terminal.draw(|f| render(f, app))?;
        }

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            match event::read()? {
                Event::Key(key) if is_interrupt(&key) => return Ok(()),
                Event::Key(key) => {
                    if let Some(input) = to_input(key) {
                        app.handle_input(input);
                    }
                }
                Event::Resize(_, _) => app.request_redraw(),
                _ => {}
            }
        }

        // Apply finished background work and navigation
        app.tick();
        tokio::task::yield_now().await;

        if app.should_quit {
            return Ok(());
        }
    }
}
