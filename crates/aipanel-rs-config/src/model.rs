//! Configuration schema for the admin panel.

use aipanel_rs_protocol::{BackendId, GenerationMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root config for the panel.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PanelConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl PanelConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Backend selected when a session starts.
    pub fn default_backend(&self) -> BackendId {
        BackendId::parse(&self.dispatch.default_backend).unwrap_or(BackendId::Gemini)
    }

    /// Mode selected when a session starts.
    pub fn default_mode(&self) -> GenerationMode {
        GenerationMode::parse(&self.dispatch.default_mode).unwrap_or_default()
    }
}

/// Builder for assembling a `PanelConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn backends(mut self, backends: BackendsConfig) -> Self {
        self.config.backends = backends;
        self
    }

    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    pub fn sampler(mut self, sampler: SamplerConfig) -> Self {
        self.config.sampler = sampler;
        self
    }

    pub fn ui(mut self, ui: UiConfig) -> Self {
        self.config.ui = ui;
        self
    }

    /// Finalize and return the built `PanelConfig`.
    pub fn build(self) -> PanelConfig {
        self.config
    }
}

/// Per-backend client settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BackendsConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub character: CharacterConfig,
}

/// Google Gemini generateContent client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_gemini_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// HTTP timeout; absent means the client never gives up.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            api_key_env: default_gemini_key_env(),
            system_prompt: None,
            temperature: None,
            max_output_tokens: None,
            timeout_secs: None,
        }
    }
}

/// Persona chat client settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterConfig {
    #[serde(default = "default_character_base_url")]
    pub base_url: String,
    #[serde(default = "default_character_model")]
    pub model: String,
    #[serde(default = "default_character_key_env")]
    pub api_key_env: String,
    /// System prompt describing the character.
    #[serde(default = "default_persona")]
    pub persona: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            base_url: default_character_base_url(),
            model: default_character_model(),
            api_key_env: default_character_key_env(),
            persona: default_persona(),
            timeout_secs: None,
        }
    }
}

/// Dispatch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Artificial latency of the placeholder media handlers.
    #[serde(default = "default_stub_latency_ms")]
    pub stub_latency_ms: u64,
    #[serde(default = "default_backend_label")]
    pub default_backend: String,
    #[serde(default = "default_mode_label")]
    pub default_mode: String,
}

impl DispatchConfig {
    pub fn stub_latency(&self) -> Duration {
        Duration::from_millis(self.stub_latency_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            stub_latency_ms: default_stub_latency_ms(),
            default_backend: default_backend_label(),
            default_mode: default_mode_label(),
        }
    }
}

/// Resource sampler settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Rolling buffer capacity per resource.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            capacity: default_capacity(),
        }
    }
}

/// Interactive surface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// Whether the usage chart is visible at startup.
    #[serde(default)]
    pub show_graph: bool,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_graph: false,
            title: default_title(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_character_base_url() -> String {
    "https://openrouter.ai/api".to_string()
}

fn default_character_model() -> String {
    "meta-llama/llama-3.1-8b-instruct".to_string()
}

fn default_character_key_env() -> String {
    "CHARACTER_TOKEN".to_string()
}

fn default_persona() -> String {
    "You are a friendly character chatting casually with the user. Stay in character.".to_string()
}

fn default_stub_latency_ms() -> u64 {
    1000
}

fn default_backend_label() -> String {
    BackendId::Gemini.label().to_string()
}

fn default_mode_label() -> String {
    GenerationMode::None.label().to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_capacity() -> usize {
    30
}

fn default_title() -> String {
    "AI Admin Panel".to_string()
}
