use super::{api_key, check_status, http_client, request_error};
use crate::error::CoreError;
use aipanel_rs_config::GeminiConfig;
use aipanel_rs_protocol::{Backend, BackendError, ChatRequest};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Categories relaxed to `OFF` in unrestricted mode.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
/// Relaxed on every request.
const DEFAULT_RELAXED_CATEGORY: &str = "HARM_CATEGORY_DANGEROUS_CONTENT";

/// Gemini `generateContent` client that keeps the running conversation.
pub struct GeminiBackend {
    config: GeminiConfig,
    client: reqwest::Client,
    history: Mutex<Vec<Content>>,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, CoreError> {
        let client = http_client(config.timeout_secs)?;
        Ok(Self {
            config,
            client,
            history: Mutex::new(Vec::new()),
        })
    }

    /// Number of stored conversation turns (user and model).
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_body(&self, request: &ChatRequest) -> GenerateContentRequest {
        let mut contents = self.history.lock().clone();
        contents.push(Content::text("user", &request.prompt));
        let categories: &[&str] = if request.unrestricted {
            &HARM_CATEGORIES
        } else {
            &[DEFAULT_RELAXED_CATEGORY]
        };
        let generation_config =
            if self.config.temperature.is_some() || self.config.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                })
            } else {
                None
            };
        GenerateContentRequest {
            contents,
            system_instruction: self
                .config
                .system_prompt
                .as_deref()
                .map(Content::instruction),
            generation_config,
            safety_settings: categories
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: "OFF".to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn send(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let key = api_key(&self.config.api_key_env)?;
        let body = self.build_body(request);
        debug!(
            "sending gemini request (model={}, turns={}, unrestricted={})",
            self.config.model,
            body.contents.len(),
            request.unrestricted
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;

        let reply = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| BackendError::Decode("response contained no text".to_string()))?;

        let mut history = self.history.lock();
        history.push(Content::text("user", &request.prompt));
        history.push(Content::text("model", &reply));
        Ok(reply)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }

    /// System instructions carry no role.
    fn instruction(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn backend() -> GeminiBackend {
        GeminiBackend::new(GeminiConfig {
            system_prompt: Some("be brief".to_string()),
            temperature: Some(0.5),
            ..GeminiConfig::default()
        })
        .expect("client")
    }

    #[test]
    fn body_relaxes_dangerous_content_only_by_default() {
        let body = serde_json::to_value(backend().build_body(&ChatRequest::new("hi"))).expect("json");
        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "systemInstruction": { "parts": [{ "text": "be brief" }] },
                "generationConfig": { "temperature": 0.5 },
                "safetySettings": [
                    { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "OFF" }
                ]
            })
        );
    }

    #[test]
    fn unrestricted_relaxes_every_category() {
        let request = ChatRequest::new("hi").with_unrestricted(true);
        let body = backend().build_body(&request);
        let categories: Vec<_> = body
            .safety_settings
            .iter()
            .map(|setting| setting.category.as_str())
            .collect();
        assert_eq!(categories, HARM_CATEGORIES.to_vec());
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let backend = GeminiBackend::new(GeminiConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..GeminiConfig::default()
        })
        .expect("client");
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
