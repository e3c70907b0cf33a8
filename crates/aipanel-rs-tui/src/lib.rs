//! Library entry point for the panel TUI.
//!
//! Provides a reusable [`run`] function that drives a pre-built
//! [`Dispatcher`] from a Ratatui terminal UI. The transcript view mirrors
//! the dispatcher's log sink and the usage chart reads the sampler's
//! shared buffers on every frame.

mod app;
mod event;
mod ui;

use anyhow::Context;
use aipanel_rs_config::UiConfig;
use aipanel_rs_core::{Dispatcher, SampleBuffers, Session};
use aipanel_rs_protocol::SinkEvent;
use app::{Action, App};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyEventKind, KeyModifiers,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use log::{debug, info, warn};
use parking_lot::Mutex;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Display settings for the TUI.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Title shown in the header.
    pub title: String,
}

impl From<&UiConfig> for TuiConfig {
    fn from(ui: &UiConfig) -> Self {
        Self {
            title: ui.title.clone(),
        }
    }
}

/// Launch the TUI against a started dispatcher.
///
/// The caller owns the dispatcher and shuts it down after `run` returns;
/// the sampler feeding `samples` is likewise started and stopped by the
/// caller. Logging must be initialized before calling `run`.
///
/// # Errors
/// Returns an error if terminal setup or the event loop fails, or if the
/// dispatcher's runner has stopped.
pub async fn run(
    dispatcher: &Dispatcher,
    session: Session,
    samples: Arc<Mutex<SampleBuffers>>,
    config: TuiConfig,
) -> anyhow::Result<()> {
    // Subscribe before the snapshot; the app drops events the snapshot
    // already reflects.
    let feed = dispatcher.sink().subscribe();
    let mut app = App::new(session, config.title, dispatcher.sink().snapshot());

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    let tasks = [
        spawn_input_handler(tx.clone()),
        spawn_tick(tx.clone()),
        spawn_transcript_feed(feed, tx),
    ];
    info!("tui started");

    let result = event_loop(&mut terminal, &mut app, &mut rx, dispatcher, &samples).await;

    for task in tasks {
        task.abort();
    }
    restore_terminal(&mut terminal)?;
    info!("tui stopped");
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    rx: &mut mpsc::Receiver<AppEvent>,
    dispatcher: &Dispatcher,
    samples: &Mutex<SampleBuffers>,
) -> anyhow::Result<()> {
    loop {
        app.pending = dispatcher.pending();
        {
            let samples = samples.lock();
            terminal.draw(|frame| ui::draw(frame, app, &samples))?;
        }

        let Some(event) = rx.recv().await else {
            debug!("event channel closed");
            return Ok(());
        };
        if handle_app_event(event, app, dispatcher)? {
            return Ok(());
        }
    }
}

/// Apply one event. Returns `true` when the UI should exit.
fn handle_app_event(
    event: AppEvent,
    app: &mut App,
    dispatcher: &Dispatcher,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => {
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }
            match app.handle_key(key) {
                Action::None => {}
                Action::Submit(text) => {
                    let outcome = dispatcher
                        .submit(&mut app.session, &text)
                        .context("submit input")?;
                    debug!("input handled (outcome={outcome:?})");
                }
                Action::Attach(path) => {
                    // Completion shows up in the transcript; no need to wait here.
                    let _pending = dispatcher
                        .attach(&app.session, path)
                        .context("schedule attachment read")?;
                }
                Action::Quit => return Ok(true),
            }
        }
        AppEvent::Tick => {}
        AppEvent::Transcript(change) => app.apply(change),
        AppEvent::Resync => app.resync(dispatcher.sink().snapshot()),
        AppEvent::Scroll(delta) => {
            if delta < 0 {
                app.scroll_up(delta.unsigned_abs());
            } else {
                app.scroll_down(delta.unsigned_abs());
            }
        }
    }
    Ok(false)
}

/// Forward keyboard and mouse-wheel input.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if !matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                tokio::task::yield_now().await;
                continue;
            }
            while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                let event = match crossterm::event::read() {
                    Ok(event) => event,
                    Err(_) => break,
                };
                let app_event = match event {
                    CrosstermEvent::Key(key) => AppEvent::Input(key),
                    CrosstermEvent::Mouse(mouse) => {
                        let lines = if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                            MOUSE_SCROLL_LINES.saturating_mul(2)
                        } else {
                            MOUSE_SCROLL_LINES
                        };
                        match mouse.kind {
                            MouseEventKind::ScrollUp => AppEvent::Scroll(-lines),
                            MouseEventKind::ScrollDown => AppEvent::Scroll(lines),
                            _ => continue,
                        }
                    }
                    _ => continue,
                };
                if sender.send(app_event).await.is_err() {
                    return;
                }
            }
        }
    })
}

/// Periodic redraw so the chart and pending count stay current.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                return;
            }
        }
    })
}

/// Relay log sink changes into the event loop.
fn spawn_transcript_feed(
    mut events: broadcast::Receiver<SinkEvent>,
    sender: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let next = match events.recv().await {
                Ok(change) => AppEvent::Transcript(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("transcript feed lagged (skipped={skipped})");
                    AppEvent::Resync
                }
                Err(RecvError::Closed) => return,
            };
            if sender.send(next).await.is_err() {
                return;
            }
        }
    })
}

/// Configure terminal for TUI rendering.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aipanel_rs_core::{EVENT_BUFFER, LogSink, TranscriptSnapshot};
    use aipanel_rs_protocol::{BackendId, GenerationMode};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn lagged_feed_resyncs_without_duplicates() {
        let sink = LogSink::new();
        let feed = sink.subscribe();
        let total = EVENT_BUFFER + 76;
        for line in 0..total {
            sink.append(format!("line-{line}"));
        }

        let mut app = App::new(
            Session::new(BackendId::Gemini, GenerationMode::None),
            "AI Admin Panel",
            TranscriptSnapshot::default(),
        );
        let (tx, mut rx) = mpsc::channel(256);
        let task = spawn_transcript_feed(feed, tx);

        let last_seq = total as u64;
        let drain = async {
            while let Some(event) = rx.recv().await {
                match event {
                    AppEvent::Transcript(change) => {
                        let seq = change.seq();
                        app.apply(change);
                        if seq == last_seq {
                            break;
                        }
                    }
                    AppEvent::Resync => app.resync(sink.snapshot()),
                    _ => {}
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), drain)
            .await
            .expect("feed drained");
        task.abort();

        let mirrored: Vec<_> = app.transcript.iter().map(|entry| entry.text.clone()).collect();
        assert_eq!(mirrored, sink.entries().into_iter().map(|entry| entry.text).collect::<Vec<_>>());
        assert_eq!(app.transcript.len(), total);
    }
}
