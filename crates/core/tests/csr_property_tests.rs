use arb_detector_core::{ExchangeGraph, csr::GraphCSR};
use common::types::{AssetId, RateQuote};
use proptest::prelude::*;
use proptest::strategy::Strategy;

const ASSETS: [&str; 8] = ["AAVE", "BTC", "DAI", "ETH", "LINK", "SOL", "USDC", "USDT"];

fn graph_strategy() -> impl Strategy<Value = ExchangeGraph> {
    let quote = (0usize..ASSETS.len(), 0usize..ASSETS.len(), 0.01f64..10.0, any::<bool>());
    prop::collection::vec(quote, 0..50).prop_map(|quotes| {
        let quotes = quotes
            .into_iter()
            .filter(|(from, to, _, _)| from != to)
            .map(|(from, to, rate, invertible)| {
                if invertible {
                    RateQuote::invertible(ASSETS[from], ASSETS[to], rate)
                } else {
                    RateQuote::one_way(ASSETS[from], ASSETS[to], rate)
                }
            });
        ExchangeGraph::from_quotes(quotes).expect("generated rates are valid")
    })
}

proptest! {
    /// Property: node_pointers should be monotonic
    #[test]
    fn node_pointers_monotonic(graph in graph_strategy()) {
        let csr = GraphCSR::from_exchange_graph(&graph);
        for i in 0..csr.num_nodes {
            prop_assert!(csr.node_pointers[i] <= csr.node_pointers[i + 1]);
        }
    }

    /// Property: edge arrays are consistent with each other and with the graph
    #[test]
    fn edge_arrays_length_consistent(graph in graph_strategy()) {
        let csr = GraphCSR::from_exchange_graph(&graph);
        prop_assert_eq!(csr.num_nodes, graph.num_nodes());
        prop_assert_eq!(csr.edge_targets.len(), graph.num_edges());
        prop_assert_eq!(csr.edge_targets.len(), csr.edge_weights.len());
        prop_assert_eq!(csr.edge_rates.len(), csr.edge_weights.len());
        prop_assert_eq!(csr.edge_targets.len(), csr.node_pointers[csr.num_nodes]); // In CSR, the last node pointer equals the total number of edges.
    }

    /// Property: CSR order matches the graph's lexicographic edge order, with -ln weights.
    #[test]
    fn edges_follow_graph_order(graph in graph_strategy()) {
        let csr = GraphCSR::from_exchange_graph(&graph);

        for (i, (from, to, rate)) in graph.edges().enumerate() {
            prop_assert_eq!(csr.assets[csr.edge_source_by_index[i]], from);
            prop_assert_eq!(csr.assets[csr.edge_targets[i]], to);
            prop_assert_eq!(csr.edge_rates[i], rate);
            prop_assert_eq!(csr.edge_weights[i], -rate.ln());
        }
    }

    /// Property: assets are sorted and every asset resolves to its own index.
    #[test]
    fn asset_indices_round_trip(graph in graph_strategy()) {
        let csr = GraphCSR::from_exchange_graph(&graph);

        prop_assert!(csr.assets.windows(2).all(|pair| pair[0] < pair[1]));
        for (i, asset) in csr.assets.iter().enumerate() {
            prop_assert_eq!(csr.index_of(asset), Some(i));
        }
        prop_assert_eq!(csr.index_of(&AssetId::from("XRP")), None);
    }

    /// Property: nodes with no outgoing edges have node_pointers[i] == node_pointers[i+1]
    #[test]
    fn nodes_without_edges(graph in graph_strategy()) {
        let csr = GraphCSR::from_exchange_graph(&graph);

        for (i, asset) in csr.assets.iter().enumerate() {
            if graph.out_degree(asset) == 0 {
                prop_assert_eq!(csr.node_pointers[i], csr.node_pointers[i + 1]);
            } else {
                prop_assert_eq!(csr.out_edges(i).len(), graph.out_degree(asset));
            }
        }
    }
}
