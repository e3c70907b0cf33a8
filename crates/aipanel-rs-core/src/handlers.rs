//! Response handlers, one per generation mode.
//!
//! Handlers never fail: backend errors are rendered into the returned text
//! so the caller can log the result like any other reply.

use crate::session::Attachment;
use aipanel_rs_protocol::{Backend, BackendId, ChatRequest, GenerationMode};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Reply when the selected backend has no registered client.
pub const UNKNOWN_BACKEND_MESSAGE: &str = "Unknown AI model selected.";
/// Reply for file-mode requests without attached content.
pub const NO_FILE_MESSAGE: &str = "No file uploaded. Please upload a file first.";

/// Registered backend clients keyed by id.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendId, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, id: BackendId, backend: Arc<dyn Backend>) -> Self {
        self.register(id, backend);
        self
    }

    pub fn register(&mut self, id: BackendId, backend: Arc<dyn Backend>) {
        self.backends.insert(id, backend);
    }

    pub fn get(&self, id: BackendId) -> Option<Arc<dyn Backend>> {
        self.backends.get(&id).cloned()
    }

    pub fn contains(&self, id: BackendId) -> bool {
        self.backends.contains_key(&id)
    }
}

/// Everything a handler needs for one request, captured at dispatch time.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub backend: BackendId,
    pub mode: GenerationMode,
    pub prompt: String,
    pub attachment: Option<Attachment>,
    pub unrestricted: bool,
}

/// The closed set of response handlers.
#[derive(Clone)]
pub struct HandlerSet {
    backends: BackendRegistry,
    stub_latency: Duration,
}

impl HandlerSet {
    pub fn new(backends: BackendRegistry, stub_latency: Duration) -> Self {
        Self {
            backends,
            stub_latency,
        }
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Produce the transcript text for `request`.
    pub async fn handle(&self, request: &GenerationRequest) -> String {
        let backend = request.backend.label();
        let prompt = request.prompt.as_str();
        match request.mode {
            GenerationMode::None => self.pass_through(request).await,
            GenerationMode::Image => {
                self.simulate_latency().await;
                format!("[ImageGen-Dummy]: Generated image using '{backend}' with prompt: '{prompt}'")
            }
            GenerationMode::Audio => {
                self.simulate_latency().await;
                format!("[AudioGen-Dummy]: Generated audio using '{backend}' with prompt: '{prompt}'")
            }
            GenerationMode::Video => {
                self.simulate_latency().await;
                format!("[VideoGen-Dummy]: Generated video using '{backend}' with prompt: '{prompt}'")
            }
            GenerationMode::File => match attached_content(request) {
                Some(attachment) => {
                    self.simulate_latency().await;
                    format!(
                        "[FileProc-Dummy]: Processed file content of length {} successfully.",
                        attachment.char_count()
                    )
                }
                None => NO_FILE_MESSAGE.to_string(),
            },
        }
    }

    async fn pass_through(&self, request: &GenerationRequest) -> String {
        let Some(backend) = self.backends.get(request.backend) else {
            debug!("no client registered (backend={})", request.backend);
            return UNKNOWN_BACKEND_MESSAGE.to_string();
        };
        let chat = ChatRequest::new(request.prompt.clone()).with_unrestricted(request.unrestricted);
        match backend.send(&chat).await {
            Ok(reply) => reply,
            Err(err) => {
                debug!(
                    "backend call failed (backend={}, category={})",
                    request.backend,
                    err.category()
                );
                err.to_string()
            }
        }
    }

    async fn simulate_latency(&self) {
        if !self.stub_latency.is_zero() {
            tokio::time::sleep(self.stub_latency).await;
        }
    }
}

/// Attachment usable for file processing; empty content counts as absent.
fn attached_content(request: &GenerationRequest) -> Option<&Attachment> {
    request
        .attachment
        .as_ref()
        .filter(|attachment| !attachment.content.is_empty())
}
