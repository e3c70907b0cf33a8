//! TUI event types for input, ticks and transcript updates.

use aipanel_rs_protocol::SinkEvent;
use crossterm::event::KeyEvent;

/// Application event emitted by input handlers or the transcript feed.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event.
    Tick,
    /// Change published by the log sink.
    Transcript(SinkEvent),
    /// The transcript feed fell behind; reload from the sink.
    Resync,
    /// Scroll event in the transcript view.
    Scroll(i16),
}
