use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use common::{
    error::Error,
    numeric_kernel::is_valid_rate,
    types::{AssetId, RateQuote, Reciprocity},
};

type Adjacency = BTreeMap<AssetId, BTreeMap<AssetId, f64>>;

/// Directed graph of conversion rates keyed by asset.
///
/// `rates[a][b]` is how many units of `b` one unit of `a` buys. Every asset mentioned by a quote
/// is a node, including assets that only ever appear as a destination (their adjacency map is
/// empty). All stored rates are finite and strictly positive.
///
/// Both levels are ordered maps, so iteration is lexicographic by source and then by
/// destination. The detector relies on this order to pick which cycle it reports.
///
/// The graph is immutable once built; use [`GraphBuilder`] or [`ExchangeGraph::from_quotes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExchangeGraph {
    rates: Adjacency,
}

impl ExchangeGraph {
    /// Builds a graph from a complete set of quotes.
    ///
    /// # Errors
    /// `Error::InvalidRate` if any rate is not finite and positive. Nothing is returned on error.
    pub fn from_quotes<I>(quotes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = RateQuote>,
    {
        Ok(GraphBuilder::new().with_quotes(quotes)?.build())
    }

    pub fn num_nodes(&self) -> usize {
        self.rates.len()
    }

    pub fn num_edges(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.rates.contains_key(asset)
    }

    /// Direct conversion rate `from -> to`, if one is modeled.
    pub fn rate(&self, from: &AssetId, to: &AssetId) -> Option<f64> {
        self.rates.get(from)?.get(to).copied()
    }

    /// Nodes in lexicographic order.
    pub fn nodes(&self) -> impl Iterator<Item = &AssetId> {
        self.rates.keys()
    }

    /// Outgoing rates of `asset`, ordered by destination.
    pub fn neighbors(&self, asset: &AssetId) -> Option<&BTreeMap<AssetId, f64>> {
        self.rates.get(asset)
    }

    pub fn out_degree(&self, asset: &AssetId) -> usize {
        self.rates.get(asset).map_or(0, BTreeMap::len)
    }

    /// All edges `(from, to, rate)`, by source then destination.
    pub fn edges(&self) -> impl Iterator<Item = (&AssetId, &AssetId, f64)> {
        self.rates
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |(to, &rate)| (from, to, rate)))
    }
}

/// Accumulates quotes into an [`ExchangeGraph`].
///
/// A quote marked [`Reciprocity::Invertible`] also inserts `to -> from` at `1 / rate`; a
/// [`Reciprocity::OneWay`] quote never implies a reverse edge. When the same directed edge is
/// supplied more than once, explicitly or through an implied reverse, the last one wins.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    rates: Adjacency,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and inserts a single quote.
    ///
    /// Validation happens before any insertion, so a rejected quote leaves the builder untouched.
    ///
    /// # Errors
    /// `Error::InvalidRate` for a non-finite or non-positive rate (or a reciprocal that overflows).
    ///
    /// A quote from an asset to itself is kept as a one-edge loop. Its reverse would be the same
    /// edge, so only the quoted rate is stored.
    pub fn add_quote(&mut self, quote: &RateQuote) -> Result<&mut Self, Error> {
        if !is_valid_rate(quote.rate) {
            return Err(Error::InvalidRate {
                from: quote.from.clone(),
                to: quote.to.clone(),
                rate: quote.rate,
            });
        }

        let reverse = match quote.reciprocity {
            Reciprocity::OneWay => None,
            Reciprocity::Invertible if quote.from == quote.to => None,
            Reciprocity::Invertible => {
                let inverse = 1.0 / quote.rate;
                if !is_valid_rate(inverse) {
                    return Err(Error::InvalidRate {
                        from: quote.to.clone(),
                        to: quote.from.clone(),
                        rate: inverse,
                    });
                }
                Some(inverse)
            }
        };

        self.insert_edge(&quote.from, &quote.to, quote.rate);
        if let Some(inverse) = reverse {
            self.insert_edge(&quote.to, &quote.from, inverse);
        }

        Ok(self)
    }

    /// Inserts every quote, stopping at the first invalid one.
    pub fn with_quotes<I>(mut self, quotes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = RateQuote>,
    {
        for quote in quotes {
            self.add_quote(&quote)?;
        }
        Ok(self)
    }

    pub fn build(self) -> ExchangeGraph {
        let graph = ExchangeGraph { rates: self.rates };
        debug!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "Exchange graph built"
        );
        graph
    }

    fn insert_edge(&mut self, from: &AssetId, to: &AssetId, rate: f64) {
        self.rates.entry(to.clone()).or_default();
        self.rates
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), rate);
    }
}

/// Derives a fully connected set of invertible quotes from ticker prices.
///
/// `prices` holds `(asset, price)` where `price` is the value of one `asset` in `quote_asset`
/// (e.g. `("BTC", 63000.0)` against `USDT`). The result contains `asset -> quote_asset` at `price`
/// and, for every pair of listed assets, `a -> b` at `price_a / price_b`. All quotes are
/// [`Reciprocity::Invertible`].
///
/// Rates derived this way are mutually consistent, so the resulting graph has no arbitrage unless
/// the caller perturbs them.
///
/// # Errors
/// `Error::InvalidRate` if a price or a derived cross rate is not finite and positive,
/// `Error::SelfLoop` if `quote_asset` is listed among `prices`.
pub fn cross_rate_quotes(
    quote_asset: &AssetId,
    prices: &[(AssetId, f64)],
) -> Result<Vec<RateQuote>, Error> {
    let mut quotes = Vec::with_capacity(prices.len() * (prices.len() + 1) / 2);

    for (asset, price) in prices {
        if asset == quote_asset {
            return Err(Error::SelfLoop(asset.clone()));
        }
        if !is_valid_rate(*price) {
            return Err(Error::InvalidRate {
                from: asset.clone(),
                to: quote_asset.clone(),
                rate: *price,
            });
        }
        quotes.push(RateQuote::invertible(asset.clone(), quote_asset.clone(), *price));
    }

    for (i, (base, base_price)) in prices.iter().enumerate() {
        for (other, other_price) in &prices[i + 1..] {
            let cross = base_price / other_price;
            if !is_valid_rate(cross) {
                return Err(Error::InvalidRate {
                    from: base.clone(),
                    to: other.clone(),
                    rate: cross,
                });
            }
            quotes.push(RateQuote::invertible(base.clone(), other.clone(), cross));
        }
    }

    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(symbol: &str) -> AssetId {
        AssetId::from(symbol)
    }

    #[test]
    fn one_way_quote_adds_single_edge() {
        let graph = ExchangeGraph::from_quotes([RateQuote::one_way("A", "B", 2.0)]).unwrap();

        assert_eq!(graph.rate(&asset("A"), &asset("B")), Some(2.0));
        assert_eq!(graph.rate(&asset("B"), &asset("A")), None);
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn destination_only_asset_is_a_node() {
        let graph = ExchangeGraph::from_quotes([RateQuote::one_way("A", "B", 2.0)]).unwrap();

        assert_eq!(graph.num_nodes(), 2);
        assert!(graph.contains(&asset("B")));
        assert_eq!(graph.out_degree(&asset("B")), 0);
        assert!(graph.neighbors(&asset("B")).unwrap().is_empty());
    }

    #[test]
    fn invertible_quote_adds_reverse_edge() {
        let graph = ExchangeGraph::from_quotes([RateQuote::invertible("A", "B", 4.0)]).unwrap();

        assert_eq!(graph.rate(&asset("A"), &asset("B")), Some(4.0));
        assert_eq!(graph.rate(&asset("B"), &asset("A")), Some(0.25));
    }

    #[test]
    fn later_quote_overrides_earlier_edge() {
        let graph = ExchangeGraph::from_quotes([
            RateQuote::invertible("A", "B", 2.0),
            RateQuote::one_way("B", "A", 0.6),
            RateQuote::one_way("A", "B", 2.5),
        ])
        .unwrap();

        assert_eq!(graph.rate(&asset("A"), &asset("B")), Some(2.5));
        assert_eq!(graph.rate(&asset("B"), &asset("A")), Some(0.6));
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn rejects_invalid_rates() {
        for rate in [0.0, -3.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = ExchangeGraph::from_quotes([RateQuote::one_way("A", "B", rate)]);
            assert!(
                matches!(result, Err(Error::InvalidRate { .. })),
                "rate {} should be rejected",
                rate
            );
        }
    }

    #[test]
    fn rejects_reciprocal_that_overflows() {
        let result = ExchangeGraph::from_quotes([RateQuote::invertible("A", "B", 1e-310)]);
        match result {
            Err(Error::InvalidRate { from, to, .. }) => {
                assert_eq!(from, asset("B"));
                assert_eq!(to, asset("A"));
            }
            other => panic!("Expected InvalidRate, got {:?}", other),
        }
    }

    #[test]
    fn accepts_self_loop() {
        let graph = ExchangeGraph::from_quotes([
            RateQuote::one_way("A", "A", 1.5),
            RateQuote::invertible("A", "B", 2.0),
        ])
        .unwrap();

        assert_eq!(graph.num_nodes(), 2);
        assert_eq!(graph.rate(&asset("A"), &asset("A")), Some(1.5));
        assert_eq!(graph.num_edges(), 3);
    }

    #[test]
    fn invertible_self_loop_keeps_quoted_rate() {
        let graph = ExchangeGraph::from_quotes([RateQuote::invertible("A", "A", 1.5)]).unwrap();

        assert_eq!(graph.rate(&asset("A"), &asset("A")), Some(1.5));
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn self_loop_with_invalid_rate_is_rejected() {
        let result = ExchangeGraph::from_quotes([RateQuote::one_way("A", "A", 0.0)]);
        assert!(matches!(result, Err(Error::InvalidRate { .. })));
    }

    #[test]
    fn failed_quote_leaves_builder_untouched() {
        let mut builder = GraphBuilder::new();
        builder.add_quote(&RateQuote::one_way("A", "B", 2.0)).unwrap();
        assert!(builder.add_quote(&RateQuote::one_way("C", "D", 0.0)).is_err());

        let graph = builder.build();
        assert_eq!(graph.num_nodes(), 2);
        assert!(!graph.contains(&asset("C")));
    }

    #[test]
    fn edges_iterate_lexicographically() {
        let graph = ExchangeGraph::from_quotes([
            RateQuote::one_way("C", "A", 1.0),
            RateQuote::one_way("A", "C", 1.0),
            RateQuote::one_way("A", "B", 1.0),
            RateQuote::one_way("B", "A", 1.0),
        ])
        .unwrap();

        let order: Vec<(&str, &str)> = graph
            .edges()
            .map(|(from, to, _)| (from.as_str(), to.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "B"), ("A", "C"), ("B", "A"), ("C", "A")]);

        let nodes: Vec<&str> = graph.nodes().map(AssetId::as_str).collect();
        assert_eq!(nodes, vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let graph = ExchangeGraph::from_quotes(Vec::new()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn serializes_as_nested_map() {
        let graph = ExchangeGraph::from_quotes([RateQuote::invertible("A", "B", 2.0)]).unwrap();
        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(json, r#"{"A":{"B":2.0},"B":{"A":0.5}}"#);
    }

    #[test]
    fn cross_rates_match_ticker_prices() {
        let usdt = asset("USDT");
        let quotes =
            cross_rate_quotes(&usdt, &[(asset("BTC"), 60_000.0), (asset("ETH"), 3_000.0)]).unwrap();
        let graph = ExchangeGraph::from_quotes(quotes).unwrap();

        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 6);
        assert_eq!(graph.rate(&asset("BTC"), &usdt), Some(60_000.0));
        assert_eq!(graph.rate(&asset("BTC"), &asset("ETH")), Some(20.0));
        assert_eq!(graph.rate(&asset("ETH"), &asset("BTC")), Some(0.05));
        assert_eq!(graph.rate(&usdt, &asset("ETH")), Some(1.0 / 3_000.0));
    }

    #[test]
    fn cross_rates_reject_bad_prices() {
        let usdt = asset("USDT");

        let result = cross_rate_quotes(&usdt, &[(asset("BTC"), 0.0)]);
        assert!(matches!(result, Err(Error::InvalidRate { .. })));

        let result = cross_rate_quotes(&usdt, &[(asset("USDT"), 1.0)]);
        assert_eq!(result, Err(Error::SelfLoop(usdt.clone())));
    }
}
