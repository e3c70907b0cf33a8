//! Background task runner hosting asynchronous handler work.
//!
//! Work runs on a single-threaded tokio runtime owned by a dedicated worker
//! thread, so the thread that owns the interactive surface only ever
//! enqueues. Each unit of work is spawned as its own task and supervised;
//! failures and panics become transcript entries instead of tearing the
//! runner down.

use crate::error::CoreError;
use crate::sink::LogSink;
use log::{debug, warn};
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

/// A boxed unit of work accepted by the runner.
pub type Job = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Persistent worker executing submitted jobs concurrently.
///
/// There is no cancellation, timeout, or backpressure: a job that never
/// completes stays in flight for the life of the runner.
pub struct TaskRunner {
    sender: Option<mpsc::UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskRunner {
    /// Start the worker thread. Failures are reported to `sink`.
    pub fn start(sink: Arc<LogSink>) -> Result<Self, CoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CoreError::RunnerStart)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let counter = in_flight.clone();
        let worker = std::thread::Builder::new()
            .name("aipanel-runner".into())
            .spawn(move || runtime.block_on(run_worker(receiver, sink, counter)))
            .map_err(CoreError::RunnerStart)?;
        debug!("task runner started");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            in_flight,
        })
    }

    /// Schedule `job` without blocking the caller.
    pub fn submit<F>(&self, job: F) -> Result<(), CoreError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(CoreError::RunnerStopped)?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if sender.send(Box::pin(job)).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(CoreError::RunnerStopped);
        }
        Ok(())
    }

    /// Jobs submitted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop accepting work and wait for every in-flight job to finish.
    pub fn shutdown(mut self) -> Result<(), CoreError> {
        self.sender.take();
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| CoreError::RunnerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for TaskRunner {
    // Dropping without `shutdown` detaches the worker; pending jobs are
    // abandoned when the process exits.
    fn drop(&mut self) {
        self.sender.take();
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<Job>,
    sink: Arc<LogSink>,
    in_flight: Arc<AtomicUsize>,
) {
    let mut supervisors = JoinSet::new();
    loop {
        tokio::select! {
            job = receiver.recv() => match job {
                Some(job) => {
                    supervisors.spawn(supervise(job, sink.clone(), in_flight.clone()));
                }
                None => break,
            },
            Some(_) = supervisors.join_next(), if !supervisors.is_empty() => {}
        }
    }
    debug!("task runner draining (in_flight={})", in_flight.load(Ordering::SeqCst));
    while supervisors.join_next().await.is_some() {}
    debug!("task runner stopped");
}

async fn supervise(job: Job, sink: Arc<LogSink>, in_flight: Arc<AtomicUsize>) {
    match tokio::spawn(job).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!("handler failed (error={err:#})");
            sink.append(format!("handler error: {err:#}"));
        }
        Err(err) => {
            let message = join_error_message(err);
            warn!("handler panicked (message={message})");
            sink.append(format!("handler error: {message}"));
        }
    }
    in_flight.fetch_sub(1, Ordering::SeqCst);
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "task cancelled".to_string();
    }
    panic_message(err.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "panic with non-string payload".to_string(),
        },
    }
}
