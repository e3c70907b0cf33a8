//! Test helpers shared across aipanel crates.

pub mod backend;
pub mod http;
pub mod probe;
pub mod transcript;

pub use backend::{
    FailingBackend, FixedBackend, PanickingBackend, RecordingBackend, SlowBackend,
};
pub use http::{RecordedRequest, StubHttpServer};
pub use probe::StaticProbe;
pub use transcript::collect_appended;
