use super::graph::ExchangeGraph;
use common::{
    error::Error,
    types::{ArbitrageCycle, AssetId},
};

/// Trait for graph solvers capable of detecting profitable conversion loops.
pub trait CycleDetector {
    /// Detects a negative cycle reachable from `source`.
    ///
    /// Returns `Ok(Some(cycle))` if a negative cycle is found,
    /// `Ok(None)` if none exists, or `Err(Error::UnknownSource)` when `source` is not a node.
    fn find_negative_cycle(
        &self,
        graph: &ExchangeGraph,
        source: &AssetId,
    ) -> Result<Option<ArbitrageCycle>, Error>;
}
