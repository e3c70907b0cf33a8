use chrono::{DateTime, Local};
use std::fmt;

/// One immutable transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position assigned by the sink; strictly increasing across appends
    /// and clears.
    pub seq: u64,
    /// Wall-clock time the entry reached the sink.
    pub timestamp: DateTime<Local>,
    /// Entry text without the timestamp prefix.
    pub text: String,
}

impl LogEntry {
    /// Stamp `text` with the current local time.
    pub fn now(seq: u64, text: impl Into<String>) -> Self {
        Self {
            seq,
            timestamp: Local::now(),
            text: text.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Change notifications published by the transcript sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A new entry was appended.
    Appended(LogEntry),
    /// All entries were removed; `seq` is the sequence number of the clear.
    Cleared { seq: u64 },
}

impl SinkEvent {
    /// Sequence number of the change, for dropping replays.
    pub fn seq(&self) -> u64 {
        match self {
            SinkEvent::Appended(entry) => entry.seq,
            SinkEvent::Cleared { seq } => *seq,
        }
    }
}
