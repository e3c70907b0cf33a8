//! Backend client tests against a local stub server.

use aipanel_rs_config::{CharacterConfig, GeminiConfig};
use aipanel_rs_core::{CharacterBackend, GeminiBackend};
use aipanel_rs_protocol::{Backend, BackendError, ChatRequest};
use aipanel_rs_test_utils::StubHttpServer;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const GEMINI_KEY_ENV: &str = "AIPANEL_TEST_GEMINI_KEY";
const CHARACTER_KEY_ENV: &str = "AIPANEL_TEST_CHARACTER_KEY";
const MISSING_KEY_ENV: &str = "AIPANEL_TEST_UNSET_KEY";

fn set_test_keys() {
    // SAFETY: only these tests touch these variables and they always write
    // the same values.
    unsafe {
        std::env::set_var(GEMINI_KEY_ENV, "gemini-secret");
        std::env::set_var(CHARACTER_KEY_ENV, "character-secret");
    }
}

fn gemini(server: &StubHttpServer) -> GeminiBackend {
    set_test_keys();
    GeminiBackend::new(GeminiConfig {
        base_url: server.base_url().to_string(),
        api_key_env: GEMINI_KEY_ENV.to_string(),
        timeout_secs: Some(5),
        ..GeminiConfig::default()
    })
    .expect("gemini client")
}

fn gemini_reply(text: &str) -> String {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
        .to_string()
}

#[tokio::test]
async fn gemini_sends_key_and_keeps_conversation() {
    let server = StubHttpServer::start(vec![
        (200, gemini_reply("first answer")),
        (200, gemini_reply("second answer")),
    ]);
    let backend = gemini(&server);

    let first = backend.send(&ChatRequest::new("one")).await.expect("first");
    let second = backend.send(&ChatRequest::new("two")).await.expect("second");

    assert_eq!(first, "first answer");
    assert_eq!(second, "second answer");
    assert_eq!(backend.history_len(), 4);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(
        requests[0].path,
        "/v1beta/models/gemini-2.5-flash:generateContent"
    );
    assert_eq!(requests[0].header("x-goog-api-key"), Some("gemini-secret"));

    let body: Value = serde_json::from_str(&requests[1].body).expect("json body");
    let roles: Vec<_> = body["contents"]
        .as_array()
        .expect("contents")
        .iter()
        .map(|content| content["role"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(roles, vec!["user", "model", "user"]);
}

#[tokio::test]
async fn gemini_status_error_keeps_history_unchanged() {
    let server = StubHttpServer::start(vec![(429, r#"{"error":"quota"}"#.to_string())]);
    let backend = gemini(&server);

    let err = backend
        .send(&ChatRequest::new("hi"))
        .await
        .expect_err("status error");

    assert_eq!(
        err,
        BackendError::Status {
            code: 429,
            body: r#"{"error":"quota"}"#.to_string()
        }
    );
    assert_eq!(err.category(), "api");
    assert_eq!(backend.history_len(), 0);
}

#[tokio::test]
async fn gemini_empty_candidates_is_a_decode_error() {
    let server = StubHttpServer::ok_json(r#"{"candidates":[]}"#);
    let err = gemini(&server)
        .send(&ChatRequest::new("hi"))
        .await
        .expect_err("decode error");
    assert_eq!(err.category(), "decode");
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let server = StubHttpServer::ok_json(gemini_reply("unused"));
    let backend = GeminiBackend::new(GeminiConfig {
        base_url: server.base_url().to_string(),
        api_key_env: MISSING_KEY_ENV.to_string(),
        ..GeminiConfig::default()
    })
    .expect("gemini client");

    let err = backend
        .send(&ChatRequest::new("hi"))
        .await
        .expect_err("credentials");

    assert_eq!(
        err.to_string(),
        format!("config error: {MISSING_KEY_ENV} is not set")
    );
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn character_sends_persona_with_bearer_token() {
    let server = StubHttpServer::ok_json(
        json!({ "choices": [{ "message": { "role": "assistant", "content": "Arr!" } }] })
            .to_string(),
    );
    set_test_keys();
    let backend = CharacterBackend::new(CharacterConfig {
        base_url: server.base_url().to_string(),
        api_key_env: CHARACTER_KEY_ENV.to_string(),
        persona: "You are a pirate.".to_string(),
        model: "persona-model".to_string(),
        timeout_secs: Some(5),
    })
    .expect("character client");

    let reply = backend
        .send(&ChatRequest::new("hello").with_unrestricted(true))
        .await
        .expect("reply");

    assert_eq!(reply, "Arr!");
    assert_eq!(backend.history_len(), 2);
    let request = &server.requests()[0];
    assert_eq!(request.path, "/v1/chat/completions");
    assert_eq!(
        request.header("authorization"),
        Some("Bearer character-secret")
    );
    let body: Value = serde_json::from_str(&request.body).expect("json body");
    assert_eq!(body["messages"][0]["content"], "You are a pirate.");
    assert_eq!(body["messages"][1]["content"], "hello");
}
