//! HTTP clients for the conversational backends.

mod character;
mod gemini;

pub use character::CharacterBackend;
pub use gemini::GeminiBackend;

use crate::error::CoreError;
use crate::handlers::BackendRegistry;
use aipanel_rs_config::BackendsConfig;
use aipanel_rs_protocol::{BackendError, BackendId};
use std::sync::Arc;
use std::time::Duration;

/// Registry with a client for every configured backend.
pub fn default_registry(config: &BackendsConfig) -> Result<BackendRegistry, CoreError> {
    Ok(BackendRegistry::new()
        .with_backend(
            BackendId::Gemini,
            Arc::new(GeminiBackend::new(config.gemini.clone())?),
        )
        .with_backend(
            BackendId::Character,
            Arc::new(CharacterBackend::new(config.character.clone())?),
        ))
}

fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client, CoreError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Read a credential from the environment at call time.
fn api_key(env_var: &str) -> Result<String, BackendError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(BackendError::Credentials(format!("{env_var} is not set"))),
    }
}

fn request_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Request("timeout".to_string())
    } else {
        BackendError::Request(err.to_string())
    }
}

/// Turn a non-success response into a status error carrying its body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        code: status.as_u16(),
        body,
    })
}
