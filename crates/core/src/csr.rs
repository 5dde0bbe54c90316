use std::ops::Range;

use super::graph::ExchangeGraph;
use common::{numeric_kernel::log_weight, types::AssetId};

/// Index-based view of an [`ExchangeGraph`] in Compressed Sparse Row (CSR) format.
///
/// Assets are numbered `0..num_nodes` in lexicographic order, and the outgoing edges of each node
/// are stored contiguously, ordered by destination:
/// - `node_pointers[u]..node_pointers[u+1]` → edges from node `u`
/// - `edge_targets[i]` -> target node of edge `i`
/// - `edge_rates[i]` -> original conversion rate of edge `i`
/// - `edge_weights[i]` -> transformed weight `-ln(rate)` of edge `i`
/// - `edge_source_by_index[i]` -> source node of edge `i`
///
/// Walking edge indices `0..num_edges` therefore visits edges by source asset, then destination
/// asset. The view borrows the graph and is rebuilt for every detection run.
#[derive(Debug, Clone)]
pub struct GraphCSR<'a> {
    pub num_nodes: usize,
    pub assets: Vec<&'a AssetId>,
    pub node_pointers: Vec<usize>,
    pub edge_targets: Vec<usize>,
    pub edge_rates: Vec<f64>,
    pub edge_weights: Vec<f64>,
    pub edge_source_by_index: Vec<usize>,
}

impl<'a> GraphCSR<'a> {
    /// Creates the CSR view of `graph`.
    ///
    /// Each edge weight is transformed as `-ln(rate)`, so a profitable loop becomes a
    /// negative-weight cycle.
    pub fn from_exchange_graph(graph: &'a ExchangeGraph) -> Self {
        let assets: Vec<&AssetId> = graph.nodes().collect();
        let num_nodes = assets.len();

        // `graph.edges()` and `assets` share the same ordering, so a binary search resolves indices.
        let edges: Vec<(usize, usize, f64)> = graph
            .edges()
            .filter_map(|(from, to, rate)| {
                let u = assets.binary_search_by(|probe| (*probe).cmp(from)).ok()?;
                let v = assets.binary_search_by(|probe| (*probe).cmp(to)).ok()?;
                Some((u, v, rate))
            })
            .collect();

        let (node_pointers, edge_targets, edge_rates, edge_weights, edge_source_by_index) =
            Self::build_csr_from_edges(num_nodes, &edges);

        Self {
            num_nodes,
            assets,
            node_pointers,
            edge_targets,
            edge_rates,
            edge_weights,
            edge_source_by_index,
        }
    }

    /// Constructs the CSR arrays with the two-pass counting technique.
    ///
    /// The first pass counts out-degrees into `node_pointers`, a prefix sum turns the counts into
    /// offsets, and the second pass drops each edge into the next free slot of its source. Edges of
    /// the same source keep their input order.
    ///
    /// `edge_source_by_index` gives O(1) edge → source lookups during cycle reconstruction,
    /// without a binary search over `node_pointers`.
    #[allow(clippy::type_complexity)]
    fn build_csr_from_edges(
        num_nodes: usize,
        edges: &[(usize, usize, f64)],
    ) -> (Vec<usize>, Vec<usize>, Vec<f64>, Vec<f64>, Vec<usize>) {
        let m = edges.len();
        let mut node_pointers = vec![0; num_nodes + 1];

        for &(u, _, _) in edges {
            node_pointers[u + 1] += 1;
        }

        for i in 1..=num_nodes {
            node_pointers[i] += node_pointers[i - 1];
        }

        let mut edge_targets = vec![0; m];
        let mut edge_rates = vec![0.0; m];
        let mut edge_weights = vec![0.0; m];
        let mut edge_source_by_index = vec![0; m];

        let mut cursor = node_pointers.clone();

        for &(u, v, rate) in edges {
            let pos = cursor[u];
            edge_targets[pos] = v;
            edge_rates[pos] = rate;
            edge_weights[pos] = log_weight(rate);
            edge_source_by_index[pos] = u;

            cursor[u] += 1;
        }

        (
            node_pointers,
            edge_targets,
            edge_rates,
            edge_weights,
            edge_source_by_index,
        )
    }

    pub fn num_edges(&self) -> usize {
        self.edge_targets.len()
    }

    /// Index of `asset`, if it is a node of the graph.
    pub fn index_of(&self, asset: &AssetId) -> Option<usize> {
        self.assets
            .binary_search_by(|probe| (*probe).cmp(asset))
            .ok()
    }

    /// CSR edge indices of the outgoing edges of node `u`.
    pub fn out_edges(&self, u: usize) -> Range<usize> {
        self.node_pointers[u]..self.node_pointers[u + 1]
    }

    /// O(1) lookup for the source node of a given edge index.
    pub fn get_edge_source_node(&self, edge_idx: usize) -> Option<usize> {
        self.edge_source_by_index.get(edge_idx).copied()
    }
}
