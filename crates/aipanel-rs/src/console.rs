//! Line-oriented console surface.
//!
//! Reads one command per line, routes it through the same dispatch loop the
//! TUI uses, and prints every transcript entry as it is appended.

use aipanel_rs_core::{Dispatcher, LogSink, Session};
use aipanel_rs_protocol::{LogEntry, SinkEvent};
use anyhow::Context;
use log::{debug, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot};

/// Prefix logged ahead of every console line before it is routed.
pub const CONSOLE_ECHO_PREFIX: &str = "[Terminal] Executing command: ";

/// Startup options for [`run_console`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    /// Submit every line under this mode label instead of the session mode.
    /// Unknown labels fall back to pass-through.
    pub mode_label: Option<String>,
    /// File read into the attachment slot before the first line is read.
    pub attach: Option<PathBuf>,
}

/// Run the console until `input` reaches end of file.
///
/// On EOF the dispatcher is shut down, outstanding replies are drained, and
/// every entry they produced is written to `output` before returning.
pub async fn run_console<R, W>(
    dispatcher: Dispatcher,
    mut session: Session,
    options: ConsoleOptions,
    input: R,
    output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let (stop_tx, stop_rx) = oneshot::channel();
    let printer = tokio::spawn(print_transcript(
        dispatcher.sink().clone(),
        dispatcher.sink().subscribe(),
        output,
        stop_rx,
    ));

    let result = async {
        if let Some(path) = options.attach {
            let loaded = dispatcher
                .attach(&session, path)
                .context("schedule attachment read")?
                .wait()
                .await;
            debug!("startup attachment read (loaded={loaded})");
        }
        read_commands(&dispatcher, &mut session, options.mode_label.as_deref(), input).await
    }
    .await;

    tokio::task::spawn_blocking(move || dispatcher.shutdown())
        .await
        .context("join runner shutdown")?
        .context("shut down runner")?;
    let _ = stop_tx.send(());
    printer.await.context("join transcript printer")??;
    result
}

async fn read_commands<R>(
    dispatcher: &Dispatcher,
    session: &mut Session,
    mode_label: Option<&str>,
    input: R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("read console input")? {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        dispatcher
            .sink()
            .append(format!("{CONSOLE_ECHO_PREFIX}{command}"));
        let outcome = match mode_label {
            Some(label) => dispatcher.submit_labeled(session, command, label),
            None => dispatcher.submit(session, command),
        }
        .context("submit console command")?;
        debug!("console command handled (outcome={outcome:?})");
    }
    debug!("console input closed");
    Ok(())
}

/// Writes entries in sequence order, each exactly once.
struct TranscriptPrinter<W> {
    sink: Arc<LogSink>,
    output: W,
    last_seq: u64,
}

impl<W: Write> TranscriptPrinter<W> {
    fn event(&mut self, event: SinkEvent) -> anyhow::Result<()> {
        if event.seq() <= self.last_seq {
            return Ok(());
        }
        self.last_seq = event.seq();
        match event {
            SinkEvent::Appended(entry) => self.write(&entry),
            SinkEvent::Cleared { .. } => {
                debug!("transcript cleared");
                Ok(())
            }
        }
    }

    /// Catch up from the sink after the feed dropped `skipped` events.
    fn lagged(&mut self, skipped: u64) -> anyhow::Result<()> {
        warn!("console printer lagged (skipped={skipped})");
        for entry in self.sink.entries_after(self.last_seq) {
            self.last_seq = entry.seq;
            self.write(&entry)?;
        }
        Ok(())
    }

    fn write(&mut self, entry: &LogEntry) -> anyhow::Result<()> {
        writeln!(self.output, "{entry}").context("write transcript entry")
    }
}

/// Write transcript entries until stopped, then flush what is still queued.
async fn print_transcript<W: Write>(
    sink: Arc<LogSink>,
    mut events: broadcast::Receiver<SinkEvent>,
    output: W,
    mut stop: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let mut printer = TranscriptPrinter {
        sink,
        output,
        last_seq: 0,
    };
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => printer.event(event)?,
                Err(RecvError::Lagged(skipped)) => printer.lagged(skipped)?,
                Err(RecvError::Closed) => break,
            },
            _ = &mut stop => {
                loop {
                    match events.try_recv() {
                        Ok(event) => printer.event(event)?,
                        Err(TryRecvError::Lagged(skipped)) => printer.lagged(skipped)?,
                        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                    }
                }
                break;
            }
        }
    }
    printer.output.flush().context("flush console output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aipanel_rs_core::EVENT_BUFFER;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn lagged_printer_writes_every_entry_once() {
        let sink = Arc::new(LogSink::new());
        let events = sink.subscribe();
        let total = EVENT_BUFFER + 50;
        for line in 0..total {
            sink.append(format!("line-{line}"));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        stop_tx.send(()).expect("stop");
        let mut output = Vec::new();
        {
            let printer = print_transcript(sink.clone(), events, &mut output, stop_rx);
            printer.await.expect("printer");
        }

        let printed: Vec<String> = String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|line| line[11..].to_string())
            .collect();
        let expected: Vec<String> = (0..total).map(|line| format!("line-{line}")).collect();
        assert_eq!(printed, expected);
    }
}
