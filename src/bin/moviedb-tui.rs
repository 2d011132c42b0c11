use std::{io::Stdout, sync::Mutex, time::Duration};

use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use moviedb::{
    client::CatalogClient,
    config::TuiConfig,
    tui::{
        app::App,
        view,
        worker::{REQUEST_CAPACITY, Request, Worker},
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};

const TICK: Duration = Duration::from_millis(50);

/// Restores the terminal even when the loop bails out with an error.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        execute!(std::io::stdout(), EnterAlternateScreen).context("entering alternate screen")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

fn main() -> anyhow::Result<()> {
    let config = TuiConfig::from_env()?;

    if let Some(path) = &config.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "info,moviedb=debug".to_string()),
            )
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    let client = CatalogClient::new(&config.server_url, config.timeout)?;
    let worker = Worker::spawn(client, REQUEST_CAPACITY).context("starting request worker")?;
    tracing::info!(server = %config.server_url, "starting tui");

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;

    let result = run(&mut terminal, &worker, App::new(config.fetch_limit));

    drop(guard);
    worker.shutdown();
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    worker: &Worker,
    mut app: App,
) -> anyhow::Result<()> {
    let first = app.refresh();
    submit(&mut app, worker, first);

    while app.running {
        terminal.draw(|frame| view::draw(frame, &app))?;

        while let Some(response) = worker.try_recv() {
            if let Some(next) = app.apply(response) {
                submit(&mut app, worker, next);
            }
        }

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(request) = app.handle_key(key) {
                submit(&mut app, worker, request);
            }
        }
    }

    Ok(())
}

fn submit(app: &mut App, worker: &Worker, request: Request) {
    if let Err(err) = worker.submit(request) {
        app.submit_failed(&err);
    }
}
