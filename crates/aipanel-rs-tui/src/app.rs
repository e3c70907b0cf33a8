//! Application state for the panel TUI.

use aipanel_rs_core::{Session, TranscriptSnapshot};
use aipanel_rs_protocol::{LogEntry, SinkEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use std::cmp::min;

const PAGE_LINES: u16 = 10;
/// Width of the `[HH:MM:SS] ` prefix, used to indent continuation lines.
const STAMP_WIDTH: usize = 11;

/// What the input line is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    /// A prompt or directive for the dispatcher.
    Prompt,
    /// A path to read as the attachment.
    AttachPath,
}

/// Work the event loop hands to the dispatcher after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(String),
    Attach(String),
    Quit,
}

/// Main application state for the TUI.
pub struct App {
    /// Backend, mode and toggles driven by the selectors.
    pub session: Session,
    pub title: String,
    /// Current input buffer.
    pub input: String,
    pub target: InputTarget,
    /// Prompt text set aside while the attach prompt is open.
    draft: String,
    /// Local mirror of the log sink.
    pub transcript: Vec<LogEntry>,
    /// Sequence number of the last sink change applied to the mirror.
    last_seq: u64,
    /// Scroll offset for the transcript view.
    pub scroll: u16,
    /// Whether to follow new entries.
    pub auto_scroll: bool,
    chat_max_scroll: u16,
    /// Requests scheduled but not yet answered.
    pub pending: usize,
}

impl App {
    pub fn new(session: Session, title: impl Into<String>, snapshot: TranscriptSnapshot) -> Self {
        Self {
            session,
            title: title.into(),
            input: String::new(),
            target: InputTarget::Prompt,
            draft: String::new(),
            transcript: snapshot.entries,
            last_seq: snapshot.seq,
            scroll: 0,
            auto_scroll: true,
            chat_max_scroll: 0,
            pending: 0,
        }
    }

    /// Status label shown on the right of the status bar.
    pub fn status(&self) -> &'static str {
        if self.pending > 0 { "running" } else { "idle" }
    }

    /// Translate one key press into state changes and an action.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Esc => match self.target {
                InputTarget::AttachPath => {
                    self.close_attach_prompt();
                    Action::None
                }
                InputTarget::Prompt => Action::Quit,
            },
            KeyCode::Enter => self.finish_input(),
            KeyCode::Char('b') if ctrl => {
                self.session.backend = self.session.backend.next();
                debug!("backend selected (backend={})", self.session.backend);
                Action::None
            }
            KeyCode::Char('o') if ctrl => {
                self.open_attach_prompt();
                Action::None
            }
            KeyCode::Tab if self.target == InputTarget::Prompt => {
                self.session.set_mode(self.session.mode().next());
                Action::None
            }
            KeyCode::BackTab if self.target == InputTarget::Prompt => {
                self.session.set_mode(self.session.mode().prev());
                Action::None
            }
            KeyCode::PageUp => {
                self.scroll_up(PAGE_LINES);
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll_down(PAGE_LINES);
                Action::None
            }
            KeyCode::Up => {
                self.scroll_up(1);
                Action::None
            }
            KeyCode::Down => {
                self.scroll_down(1);
                Action::None
            }
            KeyCode::Home => {
                self.scroll_to_top();
                Action::None
            }
            KeyCode::End => {
                self.enable_auto_scroll();
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(ch) if !ctrl => {
                self.input.push(ch);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn finish_input(&mut self) -> Action {
        let text = std::mem::take(&mut self.input);
        match self.target {
            InputTarget::Prompt => Action::Submit(text),
            InputTarget::AttachPath => {
                self.close_attach_prompt();
                let path = text.trim();
                if path.is_empty() {
                    Action::None
                } else {
                    Action::Attach(path.to_string())
                }
            }
        }
    }

    fn open_attach_prompt(&mut self) {
        if self.target == InputTarget::AttachPath {
            return;
        }
        self.draft = std::mem::take(&mut self.input);
        self.target = InputTarget::AttachPath;
    }

    fn close_attach_prompt(&mut self) {
        self.input = std::mem::take(&mut self.draft);
        self.target = InputTarget::Prompt;
    }

    /// Mirror one sink change. Changes already reflected are ignored.
    pub fn apply(&mut self, event: SinkEvent) {
        if event.seq() <= self.last_seq {
            return;
        }
        self.last_seq = event.seq();
        match event {
            SinkEvent::Appended(entry) => {
                self.transcript.push(entry);
                self.maybe_enable_auto_scroll();
            }
            SinkEvent::Cleared { .. } => {
                self.transcript.clear();
                self.scroll = 0;
                self.chat_max_scroll = 0;
                self.auto_scroll = true;
            }
        }
    }

    /// Replace the mirror after the feed lagged.
    pub fn resync(&mut self, snapshot: TranscriptSnapshot) {
        self.transcript = snapshot.entries;
        self.last_seq = snapshot.seq;
        self.maybe_enable_auto_scroll();
    }

    /// Scroll the transcript upward by a number of lines.
    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll the transcript downward by a number of lines.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = min(self.scroll.saturating_add(lines), self.chat_max_scroll);
        if self.scroll >= self.chat_max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    pub fn enable_auto_scroll(&mut self) {
        self.auto_scroll = true;
        self.scroll = self.chat_max_scroll;
    }

    /// Update scroll bounds after layout changes.
    ///
    /// Snaps to the new bottom only while following or when the view was
    /// already pinned to the old bottom.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        let was_at_bottom = self.scroll >= self.chat_max_scroll;
        self.chat_max_scroll = max_scroll;
        if self.auto_scroll || was_at_bottom {
            self.scroll = max_scroll;
            self.auto_scroll = true;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn maybe_enable_auto_scroll(&mut self) {
        if self.auto_scroll {
            self.scroll = self.chat_max_scroll;
        }
    }

    /// Render transcript entries into styled lines for the UI.
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let muted = Style::default().fg(Color::Rgb(128, 128, 128));
        if self.transcript.is_empty() {
            return vec![Line::from(Span::styled(
                " Transcript is empty. Type a prompt or /help below.",
                muted,
            ))];
        }

        let mut lines = Vec::new();
        for entry in &self.transcript {
            let style = entry_style(&entry.text);
            let stamp = format!(" [{}] ", entry.timestamp.format("%H:%M:%S"));
            let mut text_lines = entry.text.lines();
            let first = text_lines.next().unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(stamp, muted),
                Span::styled(first.to_string(), style),
            ]));
            for rest in text_lines {
                lines.push(Line::from(Span::styled(
                    format!(" {:STAMP_WIDTH$}{rest}", ""),
                    style,
                )));
            }
        }
        lines
    }
}

fn entry_style(text: &str) -> Style {
    if text.starts_with('[') && text.contains("] Input: ") {
        Style::default().fg(Color::Rgb(107, 161, 230))
    } else if text.contains("error: ") || text.starts_with("Error ") {
        Style::default().fg(Color::Rgb(236, 91, 43))
    } else {
        Style::default().fg(Color::Rgb(238, 238, 238))
    }
}
