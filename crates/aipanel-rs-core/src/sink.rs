//! Append-only transcript shared by every producer.

use aipanel_rs_protocol::{LogEntry, SinkEvent};
use log::info;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Broadcast buffer for transcript subscribers.
pub const EVENT_BUFFER: usize = 1024;

/// Entries plus the sequence number of the last change they reflect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSnapshot {
    pub entries: Vec<LogEntry>,
    /// Events with `seq` at or below this are already reflected in `entries`.
    pub seq: u64,
}

#[derive(Debug, Default)]
struct Transcript {
    entries: Vec<LogEntry>,
    last_seq: u64,
}

impl Transcript {
    fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }
}

/// Timestamped transcript with change notifications.
///
/// Each `append` stamps, numbers, stores, and publishes under one lock, so
/// the stored order, the sequence order, and the broadcast order always
/// agree. Subscribers that fall behind recover through [`snapshot`] or
/// [`entries_after`] and drop replayed events by sequence number.
///
/// [`snapshot`]: LogSink::snapshot
/// [`entries_after`]: LogSink::entries_after
#[derive(Debug)]
pub struct LogSink {
    transcript: Mutex<Transcript>,
    events: broadcast::Sender<SinkEvent>,
}

impl LogSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            transcript: Mutex::new(Transcript::default()),
            events,
        }
    }

    /// Append one entry stamped with the current wall-clock time.
    pub fn append(&self, text: impl Into<String>) -> LogEntry {
        let mut transcript = self.transcript.lock();
        let entry = LogEntry::now(transcript.next_seq(), text);
        info!(target: "aipanel::transcript", "{}", entry.text);
        transcript.entries.push(entry.clone());
        let _ = self.events.send(SinkEvent::Appended(entry.clone()));
        entry
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut transcript = self.transcript.lock();
        let seq = transcript.next_seq();
        transcript.entries.clear();
        let _ = self.events.send(SinkEvent::Cleared { seq });
    }

    /// Formatted entries (`[HH:MM:SS] text`) in append order.
    pub fn read_all(&self) -> Vec<String> {
        self.transcript
            .lock()
            .entries
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Snapshot of the raw entries in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.transcript.lock().entries.clone()
    }

    /// Entries and the last sequence number, read atomically.
    pub fn snapshot(&self) -> TranscriptSnapshot {
        let transcript = self.transcript.lock();
        TranscriptSnapshot {
            entries: transcript.entries.clone(),
            seq: transcript.last_seq,
        }
    }

    /// Stored entries numbered after `seq`, in append order.
    ///
    /// Entries removed by a clear are gone; only survivors are returned.
    pub fn entries_after(&self, seq: u64) -> Vec<LogEntry> {
        let transcript = self.transcript.lock();
        let start = transcript.entries.partition_point(|entry| entry.seq <= seq);
        transcript.entries[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.transcript.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.lock().entries.is_empty()
    }

    /// Receive every append and clear made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
        self.events.subscribe()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use regex::Regex;
    use std::sync::Arc;

    #[test]
    fn append_prefixes_clock_time() {
        let sink = LogSink::new();
        sink.append("hello");
        let lines = sink.read_all();
        let pattern = Regex::new(r"^\[\d{2}:\d{2}:\d{2}\] hello$").expect("regex");
        assert_eq!(lines.len(), 1);
        assert!(pattern.is_match(&lines[0]), "{}", lines[0]);
    }

    #[test]
    fn clear_then_append_leaves_one_entry() {
        let sink = LogSink::new();
        sink.append("one");
        sink.append("two");
        sink.clear();
        assert!(sink.read_all().is_empty());
        sink.append("three");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].text, "three");
    }

    #[test]
    fn concurrent_appends_never_interleave() {
        let sink = Arc::new(LogSink::new());
        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for line in 0..100 {
                        sink.append(format!("writer-{writer} line-{line}"));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        let entries = sink.entries();
        assert_eq!(entries.len(), 800);
        for writer in 0..8 {
            let prefix = format!("writer-{writer} ");
            let lines: Vec<_> = entries
                .iter()
                .filter(|entry| entry.text.starts_with(&prefix))
                .map(|entry| entry.text.clone())
                .collect();
            let expected: Vec<_> = (0..100)
                .map(|line| format!("writer-{writer} line-{line}"))
                .collect();
            assert_eq!(lines, expected);
        }
        assert!(entries.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[test]
    fn subscribers_see_appends_and_clears_in_order() {
        let sink = LogSink::new();
        let mut events = sink.subscribe();
        let first = sink.append("first");
        sink.clear();
        assert_eq!(events.try_recv().expect("append"), SinkEvent::Appended(first));
        assert_eq!(events.try_recv().expect("clear"), SinkEvent::Cleared { seq: 2 });
    }

    #[test]
    fn sequence_keeps_rising_across_clears() {
        let sink = LogSink::new();
        assert_eq!(sink.append("one").seq, 1);
        sink.clear();
        assert_eq!(sink.append("two").seq, 3);
        assert_eq!(sink.snapshot().seq, 3);
    }

    #[test]
    fn entries_after_returns_the_tail() {
        let sink = LogSink::new();
        for line in 0..5 {
            sink.append(format!("line-{line}"));
        }
        let tail: Vec<_> = sink.entries_after(3).into_iter().map(|entry| entry.text).collect();
        assert_eq!(tail, vec!["line-3", "line-4"]);
        assert!(sink.entries_after(5).is_empty());
    }
}
