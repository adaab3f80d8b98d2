use std::io;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mariner::cli::Args;
use mariner::logging::setup_tracing;
use mariner::noaa::Endpoints;
use mariner::runtime::MarinerRuntime;
use mariner_core::{Action, AppState, Database, Settings};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    let startup = match args.startup_target() {
        Ok(target) => target,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = setup_tracing(args.log.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), ?startup, "Starting mariner");

    let db = match Database::open(&args.db) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("Error: could not open {}: {e}", args.db.display());
            std::process::exit(1);
        }
    };

    let services = match mariner::build_services(
        Arc::clone(&db),
        Endpoints::default(),
        args.zones_csv.as_deref(),
    ) {
        Ok(services) => services,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let needs_provisioning = db.needs_provisioning().unwrap_or_else(|e| {
        warn!(error = %e, "Index probe failed, rebuilding");
        true
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runtime = MarinerRuntime::new(AppState::new(startup), services, Settings::default());
    let result = runtime
        .run(&mut terminal, Action::AppStart { needs_provisioning })
        .await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("Exiting");
    result
}
