//! Dispatch core for the AI admin panel.
//!
//! This crate owns the transcript sink, the background task runner, the
//! response handler set, the dispatch loop with its local directives, the
//! resource samplers, and the concrete backend clients.

pub mod backends;
pub mod directives;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod probe;
pub mod runner;
pub mod sampler;
pub mod session;
pub mod sink;
pub mod status;

pub use backends::{CharacterBackend, GeminiBackend, default_registry};
pub use directives::Directive;
pub use dispatch::{Dispatcher, PendingAttach, SubmitOutcome};
pub use error::CoreError;
pub use handlers::{BackendRegistry, GenerationRequest, HandlerSet};
pub use probe::SysinfoProbe;
pub use runner::TaskRunner;
pub use sampler::{RollingBuffer, SampleBuffers, Sampler};
pub use session::{Attachment, AttachmentSlot, Session};
pub use sink::{EVENT_BUFFER, LogSink, TranscriptSnapshot};
