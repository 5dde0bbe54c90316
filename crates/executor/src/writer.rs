use std::sync::Arc;
use tokio::select;
use tokio::sync::{mpsc::Receiver, watch};
use tracing::{debug, info, warn};

use super::error::Error;
use super::types::SharedGraph;
use arb_detector_core::build_graph;
use common::types::RateSnapshot;

/// Async consumer that turns rate snapshots into the shared exchange graph.
pub struct Writer {
    graph: SharedGraph,
    receiver: Receiver<RateSnapshot>,
    shutdown: watch::Receiver<()>, // signal for graceful shutdown
    applied: usize,
    rejected: usize,
}

impl Writer {
    pub fn new(
        graph: SharedGraph,
        receiver: Receiver<RateSnapshot>,
        shutdown: watch::Receiver<()>,
    ) -> Self {
        Self {
            graph,
            receiver,
            shutdown,
            applied: 0,
            rejected: 0,
        }
    }

    /// Run the writer asynchronously.
    ///
    /// Each snapshot is built into a graph outside the lock; the write lock is only held to swap
    /// the new graph in, so readers always see a complete snapshot. A snapshot that fails to build
    /// is dropped and the previous graph stays in place.
    /// Exits gracefully when the receiver is closed or shutdown signal is received.
    pub async fn process_updates(mut self) -> Result<(), Error> {
        info!("Writer ready.");

        loop {
            select! {
                snapshot = self.receiver.recv() => {
                    match snapshot {
                        Some(snapshot) => self.apply_snapshot(snapshot).await,
                        None => {
                            info!("Receiver closed, shutting down writer.");
                            break;
                        }
                    }
                }

                _ = self.shutdown.changed() => {
                    info!("Shutdown signal received, stopping writer.");
                    break;
                }
            }
        }

        info!(
            applied = self.applied,
            rejected = self.rejected,
            "Writer stopped."
        );
        Ok(())
    }

    async fn apply_snapshot(&mut self, snapshot: RateSnapshot) {
        let quotes = snapshot.len();

        match build_graph(snapshot) {
            Ok(graph) => {
                let nodes = graph.num_nodes();
                let edges = graph.num_edges();
                {
                    let mut graph_guard = self.graph.write().await;
                    *graph_guard = Arc::new(graph);
                }
                self.applied += 1;
                debug!(quotes, nodes, edges, "Snapshot applied to graph");
            }
            Err(e) => {
                self.rejected += 1;
                warn!(error = %e, quotes, "Snapshot rejected, keeping previous graph");
            }
        }
    }

    /// Public method that spawns the Writer task onto the Tokio runtime.
    ///
    /// This function consumes the Writer instance (`self`) and returns a JoinHandle,
    /// allowing the pipeline orchestrator to monitor the task.
    pub fn spawn_task(self) -> tokio::task::JoinHandle<Result<(), Error>> {
        tokio::spawn(self.process_updates())
    }
}
