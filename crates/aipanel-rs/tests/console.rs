//! Console surface integration tests.

use aipanel_rs::console::{ConsoleOptions, run_console};
use aipanel_rs::core::{BackendRegistry, Dispatcher, HandlerSet, LogSink, Session};
use aipanel_rs::protocol::{BackendId, GenerationMode};
use aipanel_rs_test_utils::{FixedBackend, RecordingBackend, StaticProbe};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    /// Printed lines with the `[HH:MM:SS] ` stamp removed.
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(|line| line.get(11..).unwrap_or_default().to_string())
            .collect()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn dispatcher(registry: BackendRegistry) -> Dispatcher {
    Dispatcher::start(
        Arc::new(LogSink::new()),
        HandlerSet::new(registry, Duration::ZERO),
        Arc::new(StaticProbe::default()),
    )
    .expect("dispatcher")
}

#[tokio::test(flavor = "multi_thread")]
async fn console_prints_echo_and_reply_for_each_line() {
    let registry = BackendRegistry::new()
        .with_backend(BackendId::Gemini, Arc::new(FixedBackend::new("hi there")));
    let output = SharedOutput::default();
    let input: &[u8] = b"hello\n\n   \n";

    run_console(
        dispatcher(registry),
        Session::new(BackendId::Gemini, GenerationMode::None),
        ConsoleOptions::default(),
        input,
        output.clone(),
    )
    .await
    .expect("console");

    assert_eq!(
        output.lines(),
        vec![
            "[Terminal] Executing command: hello",
            "[Gemini Model | None] Input: hello",
            "hi there",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn console_routes_directives() {
    let output = SharedOutput::default();
    let input: &[u8] = b"/HELP\n/bogus\n";

    run_console(
        dispatcher(BackendRegistry::new()),
        Session::new(BackendId::Gemini, GenerationMode::None),
        ConsoleOptions::default(),
        input,
        output.clone(),
    )
    .await
    .expect("console");

    assert_eq!(
        output.lines(),
        vec![
            "[Terminal] Executing command: /HELP",
            "Commands available: /clear, /help, /status, /togglegraph, /modeltube",
            "[Terminal] Executing command: /bogus",
            "Unknown command: /bogus",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_mode_label_falls_back_to_pass_through() {
    let backend = RecordingBackend::new();
    let registry = BackendRegistry::new().with_backend(BackendId::Gemini, Arc::new(backend.clone()));
    let output = SharedOutput::default();
    let input: &[u8] = b"draw a cat\n";

    run_console(
        dispatcher(registry),
        Session::new(BackendId::Gemini, GenerationMode::None),
        ConsoleOptions {
            mode_label: Some("Hologram Generation".to_string()),
            ..ConsoleOptions::default()
        },
        input,
        output.clone(),
    )
    .await
    .expect("console");

    assert_eq!(
        output.lines(),
        vec![
            "[Terminal] Executing command: draw a cat",
            "Unrecognized mode 'Hologram Generation', using None.",
            "[Gemini Model | None] Input: draw a cat",
            "echo: draw a cat",
        ]
    );
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn known_mode_label_uses_stub_handler() {
    let output = SharedOutput::default();
    let input: &[u8] = b"sunset\n";

    run_console(
        dispatcher(BackendRegistry::new()),
        Session::new(BackendId::Gemini, GenerationMode::None),
        ConsoleOptions {
            mode_label: Some("Image Generation (Dummy)".to_string()),
            ..ConsoleOptions::default()
        },
        input,
        output.clone(),
    )
    .await
    .expect("console");

    assert_eq!(
        output.lines(),
        vec![
            "[Terminal] Executing command: sunset",
            "[Gemini Model | Image Generation (Dummy)] Input: sunset",
            "[ImageGen-Dummy]: Generated image using 'Gemini Model' with prompt: 'sunset'",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn startup_attachment_is_loaded_before_first_line() {
    let mut file = tempfile::Builder::new()
        .prefix("notes")
        .suffix(".txt")
        .tempfile()
        .expect("tempfile");
    write!(file, "quarterly numbers").expect("write attachment");
    let name = file
        .path()
        .file_name()
        .expect("file name")
        .to_string_lossy()
        .into_owned();
    let output = SharedOutput::default();
    let input: &[u8] = b"go\n";

    run_console(
        dispatcher(BackendRegistry::new()),
        Session::new(BackendId::Gemini, GenerationMode::None),
        ConsoleOptions {
            mode_label: Some("File Upload (Dummy)".to_string()),
            attach: Some(file.path().to_path_buf()),
        },
        input,
        output.clone(),
    )
    .await
    .expect("console");

    assert_eq!(
        output.lines(),
        vec![
            format!("File uploaded and read: {name} (size: 17 chars)"),
            "[Terminal] Executing command: go".to_string(),
            "[Gemini Model | File Upload (Dummy)] Input: go".to_string(),
            "[FileProc-Dummy]: Processed file content of length 17 successfully.".to_string(),
        ]
    );
}
