use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc::Sender};
use tokio::task::JoinHandle;

use super::error::Error;
use arb_detector_core::ExchangeGraph;
use common::types::RateSnapshot;

/// A trait defining the contract for any source that produces rate snapshots
/// for the main processing pipeline.
///
/// Implementations must only send complete snapshots: every quote of a snapshot is
/// gathered before the snapshot is handed to the channel.
///
/// The trait bounds (`Send`, `Sync`, `'static`) are required so the streamer can be moved
/// onto the multi-threaded Tokio runtime.
#[async_trait::async_trait]
pub trait UpdateStreamer: Send + Sync + 'static {
    async fn run_stream(self, sender: Sender<RateSnapshot>) -> Result<(), Error>;
}

/// The latest fully built graph. Readers clone the inner `Arc` and release the lock at once.
pub type SharedGraph = Arc<RwLock<Arc<ExchangeGraph>>>;

pub type JoinHandleResult = JoinHandle<Result<(), Error>>;

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Sim,
    Csv(PathBuf),
}
