//! Arbitrage cycle detection over pairwise exchange rates.
//!
//! Rates are assembled into an [`ExchangeGraph`] by the graph builder, then searched for a
//! conversion loop whose rate product exceeds one. Each rate becomes an edge weight `-ln(rate)`,
//! which turns such a loop into a negative-weight cycle that Bellman–Ford can find.
//!
//! ```
//! use arb_detector_core::{build_graph, detect_cycle};
//! use common::types::{AssetId, RateQuote};
//!
//! let graph = build_graph([
//!     RateQuote::one_way("A", "B", 2.0),
//!     RateQuote::one_way("B", "A", 0.6),
//! ])
//! .unwrap();
//!
//! let result = detect_cycle(&graph, &AssetId::from("A")).unwrap();
//! assert!(result.detected);
//! assert_eq!(result.cycle, vec![AssetId::from("A"), AssetId::from("B")]);
//! ```

pub mod csr;
pub mod graph;
pub mod solver;
pub mod traits;

pub use graph::{ExchangeGraph, GraphBuilder, cross_rate_quotes};
pub use solver::BellmanFordSolver;
pub use traits::CycleDetector;

use common::{
    error::Error,
    types::{AssetId, DetectionResult, RateQuote},
};

/// Builds an exchange graph from a complete set of quotes.
///
/// # Errors
/// `Error::InvalidRate` for any rate that is not finite and positive.
pub fn build_graph<I>(quotes: I) -> Result<ExchangeGraph, Error>
where
    I: IntoIterator<Item = RateQuote>,
{
    ExchangeGraph::from_quotes(quotes)
}

/// Looks for a profitable conversion loop reachable from `source` with the default solver.
///
/// # Errors
/// `Error::UnknownSource` if `source` is not a node of `graph`.
pub fn detect_cycle(graph: &ExchangeGraph, source: &AssetId) -> Result<DetectionResult, Error> {
    BellmanFordSolver::default()
        .find_negative_cycle(graph, source)
        .map(DetectionResult::from)
}
