use super::{api_key, check_status, http_client, request_error};
use crate::error::CoreError;
use aipanel_rs_config::CharacterConfig;
use aipanel_rs_protocol::{Backend, BackendError, ChatRequest};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Persona chat over an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The persona is sent as the system message ahead of the stored history.
/// `ChatRequest::unrestricted` has no equivalent here and is ignored.
pub struct CharacterBackend {
    config: CharacterConfig,
    client: reqwest::Client,
    history: Mutex<Vec<Value>>,
}

impl CharacterBackend {
    pub fn new(config: CharacterConfig) -> Result<Self, CoreError> {
        let client = http_client(config.timeout_secs)?;
        Ok(Self {
            config,
            client,
            history: Mutex::new(Vec::new()),
        })
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_payload(&self, prompt: &str) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": self.config.persona })];
        messages.extend(self.history.lock().iter().cloned());
        messages.push(json!({ "role": "user", "content": prompt }));
        json!({
            "model": self.config.model,
            "messages": messages,
        })
    }
}

#[async_trait]
impl Backend for CharacterBackend {
    async fn send(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let key = api_key(&self.config.api_key_env)?;
        let payload = self.build_payload(&request.prompt);
        debug!(
            "sending persona chat request (model={}, history={})",
            self.config.model,
            self.history_len()
        );
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
            .map_err(request_error)?;
        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;

        let reply = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Decode(format!("unexpected response shape: {body}")))?
            .to_string();

        let mut history = self.history.lock();
        history.push(json!({ "role": "user", "content": request.prompt }));
        history.push(json!({ "role": "assistant", "content": reply }));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn payload_leads_with_persona() {
        let backend = CharacterBackend::new(CharacterConfig {
            persona: "You are a pirate.".to_string(),
            model: "test-model".to_string(),
            ..CharacterConfig::default()
        })
        .expect("client");
        assert_eq!(
            backend.build_payload("ahoy"),
            json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "You are a pirate." },
                    { "role": "user", "content": "ahoy" }
                ]
            })
        );
    }
}
