use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Prompt forwarded to a conversational backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User text, already trimmed.
    pub prompt: String,
    /// Relax provider-side content filtering where the backend supports it.
    #[serde(default)]
    pub unrestricted: bool,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            unrestricted: false,
        }
    }

    pub fn with_unrestricted(mut self, unrestricted: bool) -> Self {
        self.unrestricted = unrestricted;
        self
    }
}

/// Failures raised by backend clients.
///
/// `Display` renders as `"<category> error: <message>"`, which is the exact
/// text the pass-through handler writes to the transcript.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Transport failure before a response arrived.
    #[error("network error: {0}")]
    Request(String),
    /// Provider answered with a non-success status.
    #[error("api error: status {code}: {body}")]
    Status { code: u16, body: String },
    /// Response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Missing or unusable credentials.
    #[error("config error: {0}")]
    Credentials(String),
    /// Any other failure reported by the backend.
    #[error("AI error: {0}")]
    Failed(String),
}

impl BackendError {
    /// Short category word used as the error prefix.
    pub fn category(&self) -> &'static str {
        match self {
            BackendError::Request(_) => "network",
            BackendError::Status { .. } => "api",
            BackendError::Decode(_) => "decode",
            BackendError::Credentials(_) => "config",
            BackendError::Failed(_) => "AI",
        }
    }
}

/// Conversational backend collaborator.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one prompt and return the textual reply verbatim.
    async fn send(&self, request: &ChatRequest) -> Result<String, BackendError>;
}
