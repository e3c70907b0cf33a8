//! `aipanel` binary: interactive TUI, line console, or a one-shot status report.

use aipanel_rs::config::{LayeredConfigOptions, PanelConfig};
use aipanel_rs::console::{ConsoleOptions, run_console};
use aipanel_rs::core::status::status_report;
use aipanel_rs::core::{
    Dispatcher, HandlerSet, LogSink, Sampler, Session, SysinfoProbe, default_registry,
};
use aipanel_rs::protocol::{BackendId, GenerationMode, ResourceProbe};
use aipanel_rs::tui::TuiConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line options for the panel.
#[derive(Parser)]
#[command(name = "aipanel", version, about)]
struct Cli {
    /// Extra aipanel.json5 files applied over the discovered layers
    #[arg(long, global = true)]
    config: Vec<PathBuf>,
    /// Backend label overriding the configured default
    #[arg(long, global = true)]
    backend: Option<String>,
    /// Mode label overriding the configured default
    #[arg(long, global = true)]
    mode: Option<String>,
    /// Text file to load as the attachment at startup
    #[arg(long, global = true)]
    attach: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Interactive terminal UI (default)
    #[default]
    Tui,
    /// Read commands from stdin and print the transcript to stdout
    Console,
    /// Print one system status report and exit
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aipanel_rs::init_logging();
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded environment file: {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err).context("failed to load .env"),
    }

    let cli = Cli::parse();
    let command = cli.command.unwrap_or_default();
    info!(
        "starting aipanel (runtime_configs={}, backend_set={}, mode_set={}, attach_set={})",
        cli.config.len(),
        cli.backend.is_some(),
        cli.mode.is_some(),
        cli.attach.is_some()
    );

    let config = load_config(&cli.config)?;
    let probe: Arc<dyn ResourceProbe> = Arc::new(SysinfoProbe::new());

    match command {
        Command::Status => {
            // CPU usage is a delta; give sysinfo one full interval to measure.
            tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
            println!("{}", status_report(probe.as_ref()));
            Ok(())
        }
        Command::Console => {
            let session = session_for(&config, cli.backend.as_deref())?;
            let dispatcher = start_dispatcher(&config, probe)?;
            let options = ConsoleOptions {
                mode_label: cli.mode,
                attach: cli.attach,
            };
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            run_console(dispatcher, session, options, stdin, std::io::stdout()).await
        }
        Command::Tui => {
            let mut session = session_for(&config, cli.backend.as_deref())?;
            if let Some(label) = cli.mode.as_deref() {
                session.set_mode(GenerationMode::parse(label).context("invalid --mode")?);
            }
            let dispatcher = start_dispatcher(&config, probe.clone())?;
            if let Some(path) = cli.attach {
                // The first submit must see the attachment.
                let loaded = dispatcher.attach(&session, path)?.wait().await;
                debug!("startup attachment read (loaded={loaded})");
            }

            let sampler = Arc::new(Sampler::new(probe, config.sampler.capacity));
            let samples = sampler.buffers();
            let sampling = sampler.spawn(config.sampler.interval());

            let result = aipanel_rs::tui::run(
                &dispatcher,
                session,
                samples,
                TuiConfig::from(&config.ui),
            )
            .await;

            sampling.abort();
            tokio::task::spawn_blocking(move || dispatcher.shutdown())
                .await
                .context("join runner shutdown")??;
            result
        }
    }
}

fn session_for(config: &PanelConfig, backend: Option<&str>) -> anyhow::Result<Session> {
    let mut session = Session::from_config(config);
    if let Some(label) = backend {
        session.backend = BackendId::parse(label).context("invalid --backend")?;
    }
    Ok(session)
}

fn start_dispatcher(
    config: &PanelConfig,
    probe: Arc<dyn ResourceProbe>,
) -> anyhow::Result<Dispatcher> {
    let registry = default_registry(&config.backends).context("failed to build backend clients")?;
    let handlers = HandlerSet::new(registry, config.dispatch.stub_latency());
    Dispatcher::start(Arc::new(LogSink::new()), handlers, probe)
        .context("failed to start task runner")
}

/// Discover and merge config layers, with `--config` files applied last.
fn load_config(runtime_paths: &[PathBuf]) -> anyhow::Result<PanelConfig> {
    let cwd = std::env::current_dir().context("cwd")?;
    info!("loading layered config from cwd: {}", cwd.display());
    let options = runtime_paths
        .iter()
        .fold(LayeredConfigOptions::new(&cwd), |options, path| {
            options.with_runtime_path(path)
        });
    let layered =
        PanelConfig::load_layered_with_options(options).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}
