use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::{error::Error, fs::OpenOptions, io, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;

use app::api::ApiClient;
use app::auth::AuthService;
use app::config::Config;
use app::events::CommandRunner;
use app::session::SessionStore;
use app::tasks::TaskService;

// Start the app.
pub fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // The terminal belongs to the UI, so diagnostics go to a file
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskpad=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    tracing::info!(api_url = %config.api_url, "starting taskpad");

    // Read back a persisted session; a corrupt file means "logged out"
    let session = Arc::new(SessionStore::load(config.session_file.clone()));

    // Network stack: gateway plus the two services on top of it
    let api = Arc::new(ApiClient::new(config.api_url.clone(), Arc::clone(&session)));
    let auth = Arc::new(AuthService::new(Arc::clone(&api), Arc::clone(&session)));
    let tasks = Arc::new(TaskService::new(Arc::clone(&api)));

    // Requests run on the tokio runtime; completions come back over the
    // channel and are drained by the UI loop
    let runtime = tokio::runtime::Runtime::new()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = CommandRunner::new(runtime.handle().clone(), tx, auth, tasks);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create an app with 250 ms tick
    let tick_rate = Duration::from_millis(250);
    let app = app::ui::App::new(session, config.page_size);
    let res = app::ui::run_app(&mut terminal, app, &runner, &mut rx, tick_rate);

    // Restore previous terminal state after exit
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
