pub mod config;
pub mod csv_streamer;
pub mod error;
pub mod producer;
pub mod searcher;
pub mod simulator;
pub mod types;
pub mod writer;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{RwLock, mpsc, mpsc::Sender, watch};
use tokio::task::JoinError;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use arb_detector_core::{BellmanFordSolver, ExchangeGraph};
use common::types::{AssetId, RateSnapshot};
use csv_streamer::CsvStreamer;
use error::Error;
use producer::Producer;
use searcher::ArbSearcher;
use simulator::SimulatorStreamer;
use types::{DataSource, JoinHandleResult, SharedGraph};
use writer::Writer;

const DEFAULT_LOG_FILTER: &str = "executor=info,arb_detector_core=warn";

/// Watches exchange rates for arbitrage cycles.
#[derive(Debug, Parser)]
#[command(name = "executor", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to crates/executor/Config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset to start the cycle search from (overrides searcher.source_asset)
    #[arg(long)]
    source: Option<String>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run a simulated price stream
    Sim,
    /// Replay rate snapshots from a CSV file
    Csv {
        /// CSV file with `from,to,rate[,invertible][,snapshot]` rows
        path: PathBuf,
    },
}

impl From<Option<Mode>> for DataSource {
    fn from(mode: Option<Mode>) -> Self {
        match mode {
            None | Some(Mode::Sim) => DataSource::Sim,
            Some(Mode::Csv { path }) => DataSource::Csv(path),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(source) = cli.source {
        config.searcher.source_asset = source;
    }
    let source = DataSource::from(cli.mode);

    let shared_graph: SharedGraph = Arc::new(RwLock::new(Arc::new(ExchangeGraph::default())));

    let (sender, receiver) = mpsc::channel::<RateSnapshot>(config.executor.buffer_size);
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // Spawn tasks
    let producer_handle = spawn_producer(&source, sender, &config);
    let mut writer_handle = spawn_writer(shared_graph.clone(), receiver, shutdown_rx.clone());
    let searcher_handle = spawn_searcher(shared_graph, &config, shutdown_rx);

    // A finished writer means the producer ran dry (CSV replay done) or failed.
    let writer_finished = tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Ctrl-C received, shutting down pipeline.");
            false
        }
        result = &mut writer_handle => {
            log_task_exit("writer", result);
            true
        }
    };

    // Every receiver may already be gone; nothing left to notify then.
    let _ = shutdown_tx.send(());

    if !writer_finished {
        log_task_exit("writer", writer_handle.await);
    }
    log_task_exit("searcher", searcher_handle.await);

    producer_handle.abort();
    match producer_handle.await {
        // The writer hung up first; expected once the pipeline stops.
        Ok(Err(Error::ChannelSendFailed)) => info!(task = "producer", "Task stopped."),
        Err(e) if e.is_cancelled() => {}
        result => log_task_exit("producer", result),
    }

    info!("Pipeline shut down.");
    Ok(())
}

pub fn spawn_producer(
    source: &DataSource,
    sender: Sender<RateSnapshot>,
    config: &config::Config,
) -> JoinHandleResult {
    match source {
        DataSource::Sim => {
            info!("Starting SimulatorStreamer producer task...");
            let streamer = SimulatorStreamer::new(config.simulator.clone());
            Producer::new(streamer).spawn(sender)
        }
        DataSource::Csv(path) => {
            info!(path = %path.display(), "Starting CsvStreamer producer task...");
            let streamer = CsvStreamer::new(path.clone(), config.producer.snapshot_interval_ms);
            Producer::new(streamer).spawn(sender)
        }
    }
}

/// Spawn writer task
fn spawn_writer(
    shared_graph: SharedGraph,
    receiver: mpsc::Receiver<RateSnapshot>,
    shutdown: watch::Receiver<()>,
) -> JoinHandleResult {
    Writer::new(shared_graph, receiver, shutdown).spawn_task()
}

/// Spawn searcher task
fn spawn_searcher(
    shared_graph: SharedGraph,
    config: &config::Config,
    shutdown: watch::Receiver<()>,
) -> JoinHandleResult {
    let searcher = ArbSearcher::new(
        shared_graph,
        AssetId::from(config.searcher.source_asset.as_str()),
        Duration::from_secs(config.searcher.interval_seconds),
        BellmanFordSolver::with_tolerance(config.searcher.tolerance),
        shutdown,
    );
    tokio::spawn(searcher.search_for_arbs())
}

fn log_task_exit(task: &str, result: Result<Result<(), Error>, JoinError>) {
    match result {
        Ok(Ok(())) => info!(task, "Task finished."),
        Ok(Err(e)) => error!(task, error = %e, "Task failed."),
        Err(e) => error!(task, error = %e, "Task panicked or was cancelled."),
    }
}
