//! Schema validation helpers for panel JSON5 configuration.

use super::SchemaMode;
use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
///
/// Partial layers may omit anything; the effective config additionally
/// needs label fields to be non-empty.
pub(super) fn validate_layer_schema(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "backends", "dispatch", "sampler", "ui"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("backends") {
        validate_backends(value, layer, "backends")?;
    }
    if let Some(value) = map.get("dispatch") {
        validate_dispatch(value, mode, layer, "dispatch")?;
    }
    if let Some(value) = map.get("sampler") {
        validate_sampler(value, layer, "sampler")?;
    }
    if let Some(value) = map.get("ui") {
        validate_ui(value, layer, "ui")?;
    }
    Ok(())
}

fn validate_backends(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["gemini", "character"], layer, path)?;
    if let Some(value) = map.get("gemini") {
        validate_gemini(value, layer, &join_path(path, "gemini"))?;
    }
    if let Some(value) = map.get("character") {
        validate_character(value, layer, &join_path(path, "character"))?;
    }
    Ok(())
}

/// Validate the "backends.gemini" block.
fn validate_gemini(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "model",
            "base_url",
            "api_key_env",
            "system_prompt",
            "temperature",
            "max_output_tokens",
            "timeout_secs",
        ],
        layer,
        path,
    )?;
    for key in ["model", "base_url", "api_key_env", "system_prompt"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("temperature") {
        expect_f64(value, layer, &join_path(path, "temperature"))?;
    }
    for key in ["max_output_tokens", "timeout_secs"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "backends.character" block.
fn validate_character(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["base_url", "model", "api_key_env", "persona", "timeout_secs"],
        layer,
        path,
    )?;
    for key in ["base_url", "model", "api_key_env", "persona"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    Ok(())
}

fn validate_dispatch(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["stub_latency_ms", "default_backend", "default_mode"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("stub_latency_ms") {
        expect_u64(value, layer, &join_path(path, "stub_latency_ms"))?;
    }
    for key in ["default_backend", "default_mode"] {
        let Some(value) = map.get(key) else {
            continue;
        };
        let key_path = join_path(path, key);
        expect_string(value, layer, &key_path)?;
        if matches!(mode, SchemaMode::Full) && value.as_str().is_some_and(str::is_empty) {
            return Err(invalid_field(layer, &key_path, "label must not be empty"));
        }
    }
    Ok(())
}

fn validate_sampler(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["interval_ms", "capacity"], layer, path)?;
    for key in ["interval_ms", "capacity"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_ui(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["show_graph", "title"], layer, path)?;
    if let Some(value) = map.get("show_graph") {
        expect_bool(value, layer, &join_path(path, "show_graph"))?;
    }
    if let Some(value) = map.get("title") {
        expect_string(value, layer, &join_path(path, "title"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Non-negative integers only; negative values would wrap on decode.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
