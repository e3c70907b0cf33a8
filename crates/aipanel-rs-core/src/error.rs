//! Error types for the dispatch core.

use thiserror::Error;

/// Errors returned by core setup and submission APIs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The runner's worker thread or runtime could not be started.
    #[error("failed to start task runner: {0}")]
    RunnerStart(#[source] std::io::Error),
    /// Work was submitted after the runner shut down.
    #[error("task runner is not accepting work")]
    RunnerStopped,
    /// The runner's worker thread panicked while shutting down.
    #[error("task runner worker panicked")]
    RunnerPanicked,
    /// Building an HTTP client failed.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
