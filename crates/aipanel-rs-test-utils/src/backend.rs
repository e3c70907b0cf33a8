use aipanel_rs_protocol::{Backend, BackendError, ChatRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Replies with the same text to every prompt.
#[derive(Debug, Clone)]
pub struct FixedBackend {
    reply: String,
}

impl FixedBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Backend for FixedBackend {
    async fn send(&self, _request: &ChatRequest) -> Result<String, BackendError> {
        Ok(self.reply.clone())
    }
}

/// Fails every call with the configured error.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    error: BackendError,
}

impl FailingBackend {
    pub fn new(error: BackendError) -> Self {
        Self { error }
    }

    /// Opaque failure rendered as `AI error: <message>`.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self::new(BackendError::Failed(message.into()))
    }
}

#[async_trait]
impl Backend for FailingBackend {
    async fn send(&self, _request: &ChatRequest) -> Result<String, BackendError> {
        Err(self.error.clone())
    }
}

/// Waits before echoing `<reply>` so tests can order completions.
#[derive(Debug, Clone)]
pub struct SlowBackend {
    delay: Duration,
    reply: String,
}

impl SlowBackend {
    pub fn new(delay: Duration, reply: impl Into<String>) -> Self {
        Self {
            delay,
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl Backend for SlowBackend {
    async fn send(&self, _request: &ChatRequest) -> Result<String, BackendError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

/// Panics inside `send`.
#[derive(Debug, Clone)]
pub struct PanickingBackend {
    message: String,
}

impl PanickingBackend {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Backend for PanickingBackend {
    async fn send(&self, _request: &ChatRequest) -> Result<String, BackendError> {
        panic!("{}", self.message);
    }
}

/// Records every request and answers with `echo: <prompt>`.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn send(&self, request: &ChatRequest) -> Result<String, BackendError> {
        self.requests.lock().push(request.clone());
        Ok(format!("echo: {}", request.prompt))
    }
}
