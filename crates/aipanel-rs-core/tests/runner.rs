//! Background task runner integration tests.

use aipanel_rs_core::{CoreError, LogSink, TaskRunner};
use aipanel_rs_test_utils::collect_appended;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn failing_job_is_logged_and_runner_keeps_going() {
    let sink = Arc::new(LogSink::new());
    let mut events = sink.subscribe();
    let runner = TaskRunner::start(sink.clone()).expect("runner");

    runner
        .submit(async { Err(anyhow::anyhow!("upstream refused")) })
        .expect("submit");
    let texts = collect_appended(&mut events, 1, WAIT).await;
    assert_eq!(texts, vec!["handler error: upstream refused"]);

    let done = sink.clone();
    runner
        .submit(async move {
            done.append("still running");
            Ok(())
        })
        .expect("submit");
    let texts = collect_appended(&mut events, 1, WAIT).await;
    assert_eq!(texts, vec!["still running"]);
}

#[tokio::test]
async fn panicking_job_is_contained() {
    let sink = Arc::new(LogSink::new());
    let mut events = sink.subscribe();
    let runner = TaskRunner::start(sink.clone()).expect("runner");

    runner
        .submit(async {
            if true {
                panic!("handler blew up");
            }
            Ok(())
        })
        .expect("submit");
    let texts = collect_appended(&mut events, 1, WAIT).await;
    assert_eq!(texts, vec!["handler error: handler blew up"]);

    let done = sink.clone();
    runner
        .submit(async move {
            done.append("recovered");
            Ok(())
        })
        .expect("submit");
    assert_eq!(collect_appended(&mut events, 1, WAIT).await, vec!["recovered"]);
}

#[tokio::test]
async fn jobs_run_concurrently() {
    let sink = Arc::new(LogSink::new());
    let mut events = sink.subscribe();
    let runner = TaskRunner::start(sink.clone()).expect("runner");

    for (delay, label) in [(200, "slow"), (0, "fast")] {
        let sink = sink.clone();
        runner
            .submit(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                sink.append(label);
                Ok(())
            })
            .expect("submit");
    }

    let texts = collect_appended(&mut events, 2, WAIT).await;
    assert_eq!(texts, vec!["fast", "slow"]);
}

#[test]
fn shutdown_drains_then_rejects() {
    let sink = Arc::new(LogSink::new());
    let runner = TaskRunner::start(sink.clone()).expect("runner");
    let job_sink = sink.clone();
    runner
        .submit(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            job_sink.append("drained");
            Ok(())
        })
        .expect("submit");

    runner.shutdown().expect("shutdown");
    assert_eq!(sink.read_all().len(), 1);
    assert!(sink.read_all()[0].ends_with("drained"));
}

#[test]
fn stopped_error_message() {
    assert_eq!(
        CoreError::RunnerStopped.to_string(),
        "task runner is not accepting work"
    );
}
