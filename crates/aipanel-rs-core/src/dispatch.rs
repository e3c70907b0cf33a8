//! Dispatch loop: classify one line of input and route it.
//!
//! Everything here runs on the caller's thread and never waits on a
//! backend; generation requests are echoed to the transcript and handed to
//! the [`TaskRunner`], whose completion path appends the reply later.

use crate::directives::{self, DIRECTIVE_PREFIX, Directive};
use crate::error::CoreError;
use crate::handlers::{GenerationRequest, HandlerSet};
use crate::runner::TaskRunner;
use crate::session::{Attachment, Session};
use crate::sink::LogSink;
use crate::status::status_report;
use aipanel_rs_protocol::{GenerationMode, ResourceProbe};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Logged when non-file input is blank.
pub const EMPTY_INPUT_MESSAGE: &str = "Type something before sending.";

/// What `submit` did with one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was blank outside file mode; nothing dispatched.
    Rejected,
    /// A local directive ran.
    Directive(Directive),
    /// Slash input that matched no directive.
    UnknownDirective,
    /// A generation request was echoed and scheduled.
    Dispatched(Uuid),
}

/// Completion of a [`Dispatcher::attach`] read.
#[derive(Debug)]
pub struct PendingAttach(oneshot::Receiver<bool>);

impl PendingAttach {
    /// Wait for the read. Returns `true` when the attachment was stored.
    pub async fn wait(self) -> bool {
        self.0.await.unwrap_or(false)
    }
}

/// Routes input to directives or to the handler set.
pub struct Dispatcher {
    sink: Arc<LogSink>,
    runner: TaskRunner,
    handlers: Arc<HandlerSet>,
    probe: Arc<dyn ResourceProbe>,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<LogSink>,
        runner: TaskRunner,
        handlers: HandlerSet,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self {
        Self {
            sink,
            runner,
            handlers: Arc::new(handlers),
            probe,
        }
    }

    /// Start a runner reporting into `sink` and build a dispatcher on it.
    pub fn start(
        sink: Arc<LogSink>,
        handlers: HandlerSet,
        probe: Arc<dyn ResourceProbe>,
    ) -> Result<Self, CoreError> {
        let runner = TaskRunner::start(sink.clone())?;
        Ok(Self::new(sink, runner, handlers, probe))
    }

    pub fn sink(&self) -> &Arc<LogSink> {
        &self.sink
    }

    pub fn probe(&self) -> &Arc<dyn ResourceProbe> {
        &self.probe
    }

    /// Requests scheduled but not yet answered.
    pub fn pending(&self) -> usize {
        self.runner.in_flight()
    }

    /// Handle one line of input using the session's current mode.
    pub fn submit(&self, session: &mut Session, raw: &str) -> Result<SubmitOutcome, CoreError> {
        let mode = session.mode();
        self.route(session, raw, mode)
    }

    /// Like [`submit`](Self::submit) with the mode given by display label.
    ///
    /// An unrecognized label is reported and the request falls back to
    /// pass-through. The session's own mode is left untouched.
    pub fn submit_labeled(
        &self,
        session: &mut Session,
        raw: &str,
        mode_label: &str,
    ) -> Result<SubmitOutcome, CoreError> {
        let mode = match GenerationMode::parse(mode_label) {
            Ok(mode) => mode,
            Err(err) => {
                warn!("falling back to pass-through ({err})");
                self.sink.append(format!(
                    "Unrecognized mode '{mode_label}', using {}.",
                    GenerationMode::None
                ));
                GenerationMode::None
            }
        };
        self.route(session, raw, mode)
    }

    /// Read `path` on the runner and store it as the session attachment.
    ///
    /// The slot is filled before the confirmation entry is appended. Await
    /// the returned handle to hold input until the read has finished.
    pub fn attach(
        &self,
        session: &Session,
        path: impl Into<PathBuf>,
    ) -> Result<PendingAttach, CoreError> {
        let path = path.into();
        let slot = session.attachment().clone();
        let sink = self.sink.clone();
        let (done, pending) = oneshot::channel();
        self.runner.submit(async move {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    let attachment = Attachment::new(name, content);
                    let message = format!(
                        "File uploaded and read: {} (size: {} chars)",
                        attachment.name,
                        attachment.char_count()
                    );
                    slot.set(attachment);
                    sink.append(message);
                    let _ = done.send(true);
                }
                Err(err) => {
                    debug!("attachment read failed (path={}, error={err})", path.display());
                    slot.clear();
                    sink.append(format!("Error reading file: {err}"));
                    let _ = done.send(false);
                }
            }
            Ok(())
        })?;
        Ok(PendingAttach(pending))
    }

    /// Stop accepting input and wait for outstanding requests.
    pub fn shutdown(self) -> Result<(), CoreError> {
        self.runner.shutdown()
    }

    fn route(
        &self,
        session: &mut Session,
        raw: &str,
        mode: GenerationMode,
    ) -> Result<SubmitOutcome, CoreError> {
        let text = raw.trim();
        if text.is_empty() && !mode.requires_attachment() {
            self.sink.append(EMPTY_INPUT_MESSAGE);
            return Ok(SubmitOutcome::Rejected);
        }
        if text.starts_with(DIRECTIVE_PREFIX) {
            return Ok(self.run_directive(session, text));
        }
        self.dispatch(session, text, mode)
    }

    fn run_directive(&self, session: &mut Session, text: &str) -> SubmitOutcome {
        let Some(directive) = Directive::parse(text) else {
            self.sink
                .append(format!("Unknown command: {}", directives::normalize(text)));
            return SubmitOutcome::UnknownDirective;
        };
        debug!("running directive (name={})", directive.name());
        match directive {
            Directive::Clear => self.sink.clear(),
            Directive::Help => {
                self.sink.append(directives::help_text());
            }
            Directive::Status => {
                self.sink.append(status_report(self.probe.as_ref()));
            }
            Directive::ToggleGraph => {
                session.graph_visible = !session.graph_visible;
                self.sink.append(if session.graph_visible {
                    "Graph display enabled."
                } else {
                    "Graph display disabled."
                });
            }
            Directive::ModelTube => {
                session.unrestricted = !session.unrestricted;
                self.sink.append(if session.unrestricted {
                    "ModelTube mode enabled. (unrestricted responses)"
                } else {
                    "ModelTube mode disabled. (standard responses)"
                });
            }
        }
        SubmitOutcome::Directive(directive)
    }

    fn dispatch(
        &self,
        session: &Session,
        text: &str,
        mode: GenerationMode,
    ) -> Result<SubmitOutcome, CoreError> {
        let request = GenerationRequest {
            backend: session.backend,
            mode,
            prompt: text.to_string(),
            attachment: if mode.requires_attachment() {
                session.attachment().get()
            } else {
                None
            },
            unrestricted: session.unrestricted,
        };
        self.sink.append(format!(
            "[{} | {}] Input: {}",
            request.backend, request.mode, request.prompt
        ));

        let request_id = Uuid::new_v4();
        debug!(
            "dispatching request (id={}, backend={}, mode={})",
            request_id, request.backend, request.mode
        );
        let handlers = self.handlers.clone();
        let sink = self.sink.clone();
        self.runner.submit(async move {
            let reply = handlers.handle(&request).await;
            debug!("request completed (id={request_id})");
            sink.append(reply);
            Ok(())
        })?;
        Ok(SubmitOutcome::Dispatched(request_id))
    }
}
