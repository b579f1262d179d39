mod app;
mod config;
mod feed;
mod logging;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use config::load_config;
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use feed::{build_client, FeedTasks, FEED_QUEUE_CAPACITY};
use futures_util::StreamExt;
use logging::init_logging;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

type DashboardTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let log_guard = init_logging(&config);
    info!(
        event = "dashboard_start",
        base_url = %config.base_url,
        log_file = ?log_guard.as_ref().and_then(|guard| guard.path()),
        task_poll_ms = config.task_poll.as_millis() as u64
    );

    let client = build_client().context("building http client")?;
    let (feed_tx, mut feed_rx) = mpsc::channel(FEED_QUEUE_CAPACITY);
    let (refresh_tx, refresh_rx) = mpsc::channel(1);
    let mut feeds = FeedTasks::spawn(client, &config, feed_tx, refresh_rx);
    let mut app = App::new(config);

    let mut terminal = setup_terminal()?;
    let outcome = run(&mut terminal, &mut app, &mut feeds, &mut feed_rx, &refresh_tx).await;
    let restored = restore_terminal(&mut terminal);
    feeds.shutdown();
    info!(event = "dashboard_stop");
    drop(log_guard);

    outcome?;
    restored
}

async fn run(
    terminal: &mut DashboardTerminal,
    app: &mut App,
    feeds: &mut FeedTasks,
    feed_rx: &mut mpsc::Receiver<feed::FeedEvent>,
    refresh_tx: &mpsc::Sender<()>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        terminal.draw(|frame| ui::render(frame, app, Instant::now()))?;
        tokio::select! {
            _ = redraw.tick() => {}
            Some(event) = feed_rx.recv() => {
                app.apply_feed(event, Instant::now());
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => match app.handle_event(event) {
                        AppCommand::Quit => break,
                        AppCommand::Trigger(action) => feeds.trigger(action),
                        AppCommand::RefreshTasks => {
                            // A refresh already queued covers this one.
                            let _ = refresh_tx.try_send(());
                        }
                        AppCommand::Nothing => {}
                    },
                    Some(Err(err)) => warn!(event = "terminal_event_error", error = %err),
                    None => break,
                }
            }
            _ = &mut ctrl_c => break,
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<DashboardTerminal> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut DashboardTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
