//! dove-news: a terminal headline viewer built on the `dove_news` client.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ Observable ┌──────────┐  draw()  ┌──────────┐
//! │ feed.rs  │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (client) │  (peeked)  │ (state)  │          │ (render) │
//! └──────────┘            └──────────┘          └──────────┘
//!                              ▲
//!                              │ handle_key_event()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`feed`**: issues the chosen request and peeks at its observable.
//! * **`app`**: owns all view state (rows, scroll position, status).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`main`**: parses flags, sets up logging, the client, and the
//!   terminal, then runs the event loop.

mod app;
mod feed;
mod input;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{App, Entry};
use dove_news::{ClientConfig, ClientFactory, Specification};
use feed::{Feed, FeedMsg, Request};

/// Browse top headlines, search results, or sources from newsapi.org.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Headline / source category.
    #[arg(long, default_value = "technology")]
    category: String,

    /// Two-letter country code for headlines.
    #[arg(long, default_value = "us")]
    country: String,

    /// newsapi.org API key.
    #[arg(long, default_value = "")]
    api_key: String,

    /// Search all articles for this text instead of listing headlines.
    #[arg(long, conflicts_with = "sources")]
    query: Option<String>,

    /// List sources in the category instead of headlines.
    #[arg(long)]
    sources: bool,

    /// Response cache directory.  Defaults to a directory under the system
    /// temp dir.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// TOML file overriding client settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where log output goes; the terminal itself is taken by the UI.
    #[arg(long, default_value = "dove-news.log")]
    log_file: PathBuf,

    /// Log filter, e.g. `info` or `dove_news=debug`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn request(&self) -> Request {
        let spec = Specification::new(&self.category, &self.country, &self.api_key);
        match (&self.query, self.sources) {
            (Some(query), _) => Request::Search(query.clone()),
            (None, true) => Request::Sources(spec),
            (None, false) => Request::Headlines(spec),
        }
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let Some(path) = &self.config else {
            return Ok(ClientConfig::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("dove-news-cache"))
    }
}

/// Log to `--log-file` through a background writer.  Buffered lines are
/// flushed when the returned guard is dropped.
fn init_logging(args: &Args) -> Result<WorkerGuard> {
    let file = File::create(&args.log_file)
        .with_context(|| format!("creating log file {}", args.log_file.display()))?;
    let (writer, guard) = non_blocking(file);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();
    Ok(guard)
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before printing a panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args)?;
    install_panic_hook();

    // -- build the shared client ---------------------------------------------
    // Requests run on the client's own worker threads.
    let factory = ClientFactory::new(args.client_config()?);
    let client = factory
        .get_instance(&args.cache_dir())
        .context("building news client")?;

    let mut feed = Feed::new(client, args.request());
    feed.issue();

    // -- terminal setup (Drop restores on exit or panic) --------------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(feed.request().label());

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Pick up a finished response, if any.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Process feed responses
        if let Some(msg) = feed.try_recv() {
            let entries: Vec<Entry> = match msg {
                FeedMsg::Articles(articles) => articles.iter().map(Entry::from).collect(),
                FeedMsg::Sources(sources) => sources.iter().map(Entry::from).collect(),
            };
            app.status = format!("Fetched {} items", entries.len());
            app.show(entries);
        }

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.refresh {
            app.refresh = false;
            feed.issue();
            app.status = "Refreshing…".into();
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_lines_reach_the_file_once_the_guard_drops() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("viewer.log");
        let args = Args::parse_from([
            "dove-news",
            "--log-file",
            log_file.to_str().unwrap(),
            "--log-level",
            "info",
        ]);

        let guard = init_logging(&args).unwrap();
        tracing::info!("viewer started for {}", args.request().label());
        drop(guard);

        let written = std::fs::read_to_string(&log_file).unwrap();
        assert!(written.contains("viewer started for"));
    }
}
