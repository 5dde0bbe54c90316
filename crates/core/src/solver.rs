use std::f64;
use tracing::debug;

use super::csr::GraphCSR;
use super::graph::ExchangeGraph;
use super::traits::CycleDetector;
use common::{
    error::Error,
    numeric_kernel::{DEFAULT_PROFIT_TOLERANCE, RELAXATION_EPSILON, relax},
    types::{ArbitrageCycle, AssetId},
};

/// Single-source Bellman–Ford solver reporting the first negative cycle reachable from the source.
///
/// Edges are scanned in CSR order (source asset, then destination asset, both lexicographic). When
/// several profitable loops exist, the one reported is the first whose edge fails the final
/// relaxation check in that order, not the most profitable one.
///
/// A reconstructed loop is only reported when `log_rate_sum < -tolerance`.
#[derive(Debug, Clone, Copy)]
pub struct BellmanFordSolver {
    tolerance: f64,
    relaxation_epsilon: f64,
}

impl Default for BellmanFordSolver {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_PROFIT_TOLERANCE,
            relaxation_epsilon: RELAXATION_EPSILON,
        }
    }
}

impl BellmanFordSolver {
    /// Solver with a custom acceptance tolerance (log space, clamped to be non-negative).
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
            ..Self::default()
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Reconstructs the loop that the predecessor chain of `start` runs into.
    ///
    /// `start` is the node flagged by the detection pass. It may sit downstream of the loop rather
    /// than on it, so the chain is first followed until a node repeats; that node is inside the
    /// loop and becomes the anchor. The loop is then collected backwards from the anchor and
    /// reversed into conversion order, ending at the anchor.
    ///
    /// # Arguments
    /// * `start` - Node flagged by the detection pass.
    /// * `pred_edge_idx` - CSR index of the edge that last improved each node, if any.
    /// * `graph` - The CSR view the relaxation ran on.
    ///
    /// # Returns
    /// `None` if the predecessor chain is broken (reaches a node that was never improved).
    pub fn reconstruct_cycle(
        &self,
        start: usize,
        pred_edge_idx: &[Option<usize>],
        graph: &GraphCSR,
    ) -> Option<ArbitrageCycle> {
        let num_nodes = graph.num_nodes;
        if start >= num_nodes {
            return None;
        }

        let predecessor = |node: usize| -> Option<usize> {
            pred_edge_idx[node].and_then(|edge_idx| graph.get_edge_source_node(edge_idx))
        };

        let mut visited = vec![false; num_nodes];
        let mut trace_node = start;
        while !visited[trace_node] {
            visited[trace_node] = true;
            trace_node = predecessor(trace_node)?;
        }

        let anchor = trace_node;
        let mut nodes = vec![anchor];
        let mut current = predecessor(anchor)?;
        while current != anchor {
            if nodes.len() > num_nodes {
                return None;
            }
            nodes.push(current);
            current = predecessor(current)?;
        }

        nodes.reverse();

        let len = nodes.len();
        let mut rates = Vec::with_capacity(len);
        let mut log_rate_sum = 0.0f64;

        // The hop `nodes[i] -> nodes[i + 1]` is the predecessor edge of `nodes[i + 1]`.
        for i in 0..len {
            let next = nodes[(i + 1) % len];
            let edge_idx = pred_edge_idx[next]?;
            rates.push(graph.edge_rates[edge_idx]);
            log_rate_sum += graph.edge_weights[edge_idx];
        }

        let path = nodes
            .into_iter()
            .map(|node| graph.assets[node].clone())
            .collect();

        Some(ArbitrageCycle {
            path,
            rates,
            log_rate_sum,
        })
    }
}

impl CycleDetector for BellmanFordSolver {
    /// Runs `n - 1` relaxation passes from `source`, then one detection pass.
    ///
    /// # Parameters
    /// - `graph`: The exchange graph; a CSR view is built from it for this call only.
    /// - `source`: Asset the search starts from. Loops it cannot reach are not found.
    ///
    /// # Returns
    /// - `Ok(Some(cycle))` → Profitable loop found.
    /// - `Ok(None)` → No profitable loop reachable, or the graph is too small to hold one.
    /// - `Err(Error::UnknownSource)` → `source` is not a node of `graph`.
    fn find_negative_cycle(
        &self,
        graph: &ExchangeGraph,
        source: &AssetId,
    ) -> Result<Option<ArbitrageCycle>, Error> {
        let csr = GraphCSR::from_exchange_graph(graph);
        let source_idx = csr
            .index_of(source)
            .ok_or_else(|| Error::UnknownSource(source.clone()))?;

        let num_nodes = csr.num_nodes;
        let num_edges = csr.num_edges();

        if num_nodes < 2 || csr.out_edges(source_idx).is_empty() {
            debug!(%source, num_nodes, "Degenerate graph, nothing to search");
            return Ok(None);
        }

        debug!(%source, num_nodes, num_edges, "Starting Bellman-Ford search");

        let eps = self.relaxation_epsilon;
        let mut distance = vec![f64::INFINITY; num_nodes];
        // Stores the CSR index of the predecessor edge.
        let mut pred_edge_idx: Vec<Option<usize>> = vec![None; num_nodes];
        distance[source_idx] = 0.0;

        for pass in 0..num_nodes - 1 {
            let mut updated = false;

            for i in 0..num_edges {
                let u = csr.edge_source_by_index[i];
                let v = csr.edge_targets[i];
                if let Some(improved) = relax(distance[u], csr.edge_weights[i], distance[v], eps) {
                    distance[v] = improved;
                    pred_edge_idx[v] = Some(i);
                    updated = true;
                }
            }

            // A quiet pass means the detection pass below would flag nothing either.
            if !updated {
                debug!(pass, "Distances converged early, no negative cycle");
                return Ok(None);
            }
        }

        for i in 0..num_edges {
            let u = csr.edge_source_by_index[i];
            let v = csr.edge_targets[i];
            if relax(distance[u], csr.edge_weights[i], distance[v], eps).is_none() {
                continue;
            }

            // The flagged edge closes the loop; without it a lap back into the source has no
            // predecessor to follow.
            pred_edge_idx[v] = Some(i);

            match self.reconstruct_cycle(v, &pred_edge_idx, &csr) {
                Some(cycle) if cycle.log_rate_sum < -self.tolerance => {
                    debug!(
                        hops = cycle.hop_count(),
                        product = cycle.product_rate(),
                        "Negative cycle found"
                    );
                    return Ok(Some(cycle));
                }
                Some(cycle) => {
                    debug!(
                        product = cycle.product_rate(),
                        tolerance = self.tolerance,
                        "Cycle within tolerance of break-even, skipping"
                    );
                }
                None => {
                    debug!(edge = i, "Predecessor chain broken, skipping edge");
                }
            }
        }

        Ok(None)
    }
}
