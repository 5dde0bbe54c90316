use tokio::select;
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

use super::{error::Error, types::SharedGraph};
use arb_detector_core::traits::CycleDetector;
use common::{
    error::Error as DetectorError,
    types::{ArbitrageCycle, AssetId},
};

pub type SearchOutcome = Result<Option<ArbitrageCycle>, DetectorError>;

/// Periodically searches the latest graph snapshot for arbitrage starting at `source`.
pub struct ArbSearcher<S> {
    solver: S,
    graph: SharedGraph,
    source: AssetId,
    interval: Duration,
    shutdown: watch::Receiver<()>,
}

impl<S> ArbSearcher<S>
where
    S: CycleDetector,
{
    pub fn new(
        graph: SharedGraph,
        source: AssetId,
        interval: Duration,
        solver: S,
        shutdown: watch::Receiver<()>,
    ) -> Self {
        ArbSearcher {
            solver,
            graph,
            source,
            interval,
            shutdown,
        }
    }

    /// Runs until the shutdown signal, then performs one last search on the final snapshot.
    pub async fn search_for_arbs(mut self) -> Result<(), Error> {
        info!(source = %self.source, "Searcher ready.");

        let mut interval = time::interval(self.interval);

        // The first tick occurs immediately, but we skip it to wait the full duration
        interval.tick().await;

        loop {
            select! {
                _ = interval.tick() => {
                    self.search_once().await;
                }

                _ = self.shutdown.changed() => {
                    info!("Shutdown signal received, running final search.");
                    self.search_once().await;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Searches the current snapshot once and logs the outcome.
    ///
    /// Returns `None` while no snapshot has been applied yet.
    pub async fn search_once(&self) -> Option<SearchOutcome> {
        let graph_snapshot = {
            let graph_guard = self.graph.read().await;
            graph_guard.clone()
        };

        if graph_snapshot.is_empty() {
            debug!("Searcher: No snapshot applied yet. Skipping.");
            return None;
        }

        debug!(
            nodes = graph_snapshot.num_nodes(),
            edges = graph_snapshot.num_edges(),
            "Searcher: Starting cycle search on new snapshot..."
        );

        let outcome = self.solver.find_negative_cycle(&graph_snapshot, &self.source);

        match &outcome {
            Ok(Some(cycle)) => {
                info!(
                    %cycle,
                    hops = cycle.hop_count(),
                    profit_pct = cycle.profit_percentage(),
                    "Arbitrage cycle found"
                );
            }
            Ok(None) => {
                info!("Search complete: No arbitrage opportunities.");
            }
            Err(e) => {
                warn!(error = %e, "Searcher Error: cycle search failed. Continuing.");
            }
        }

        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_detector_core::{BellmanFordSolver, ExchangeGraph};
    use common::types::RateQuote;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn searcher_for(
        graph: ExchangeGraph,
        source: &str,
    ) -> (ArbSearcher<BellmanFordSolver>, watch::Sender<()>) {
        let shared = Arc::new(RwLock::new(Arc::new(graph)));
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let searcher = ArbSearcher::new(
            shared,
            AssetId::from(source),
            Duration::from_millis(10),
            BellmanFordSolver::default(),
            shutdown_rx,
        );
        (searcher, shutdown_tx)
    }

    #[tokio::test]
    async fn test_search_once_finds_cycle() {
        let graph = ExchangeGraph::from_quotes([
            RateQuote::one_way("A", "B", 2.0),
            RateQuote::one_way("B", "A", 0.6),
        ])
        .unwrap();
        let (searcher, _shutdown) = searcher_for(graph, "A");

        let cycle = searcher
            .search_once()
            .await
            .expect("snapshot applied")
            .expect("source exists")
            .expect("loop is profitable");
        assert_eq!(cycle.path, vec![AssetId::from("A"), AssetId::from("B")]);
    }

    #[tokio::test]
    async fn test_search_once_skips_empty_graph() {
        let (searcher, _shutdown) = searcher_for(ExchangeGraph::default(), "A");
        assert!(searcher.search_once().await.is_none());
    }

    #[tokio::test]
    async fn test_search_once_reports_unknown_source() {
        let graph = ExchangeGraph::from_quotes([RateQuote::invertible("A", "B", 2.0)]).unwrap();
        let (searcher, _shutdown) = searcher_for(graph, "Z");

        let outcome = searcher.search_once().await.expect("snapshot applied");
        assert_eq!(outcome, Err(DetectorError::UnknownSource(AssetId::from("Z"))));
    }

    #[tokio::test]
    async fn test_search_once_reports_unknown_source_on_single_node_graph() {
        let graph = ExchangeGraph::from_quotes([RateQuote::one_way("A", "A", 1.5)]).unwrap();
        let (searcher, _shutdown) = searcher_for(graph, "Z");

        let outcome = searcher.search_once().await.expect("snapshot applied");
        assert_eq!(outcome, Err(DetectorError::UnknownSource(AssetId::from("Z"))));
    }

    #[tokio::test]
    async fn test_search_once_single_node_graph_has_no_cycle() {
        let graph = ExchangeGraph::from_quotes([RateQuote::one_way("A", "A", 1.5)]).unwrap();
        let (searcher, _shutdown) = searcher_for(graph, "A");

        assert_eq!(searcher.search_once().await, Some(Ok(None)));
    }

    #[tokio::test]
    async fn test_search_loop_stops_on_shutdown() {
        let graph = ExchangeGraph::from_quotes([RateQuote::invertible("A", "B", 2.0)]).unwrap();
        let (searcher, shutdown) = searcher_for(graph, "A");

        let handle = tokio::spawn(searcher.search_for_arbs());
        shutdown.send(()).unwrap();

        let result = time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("searcher should stop on shutdown");
        assert!(result.unwrap().is_ok());
    }
}
