//! Shared vocabulary for the AI admin panel: selections, transcript entries,
//! resource samples, and the collaborator traits the core dispatches through.

mod backend;
mod probe;
mod selection;
mod transcript;

pub use backend::{Backend, BackendError, ChatRequest};
pub use probe::{ResourceKind, ResourceProbe, Sample};
pub use selection::{BackendId, GenerationMode, UnknownLabel};
pub use transcript::{LogEntry, SinkEvent};
