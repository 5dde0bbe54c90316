// ----------------------------
// Detector benchmark inputs
// ----------------------------

use arb_detector_core::{ExchangeGraph, cross_rate_quotes};
use common::types::{AssetId, RateQuote};

/// Number of assets in the ring benchmark.
pub const RING_ASSETS: usize = 2_000;

/// Number of priced assets in the consistent benchmark (complete graph).
pub const CONSISTENT_ASSETS: usize = 120;

pub const FEE_MULTIPLIER: f64 = 0.997; // 30 basis points fee (1 - 0.0030)

/// Quoted rate of every ring hop before the fee.
pub const RING_GROSS_RATE: f64 = 1.004;

pub fn asset(i: usize) -> AssetId {
    AssetId::new(format!("T{:05}", i))
}

/// A single profitable ring of `RING_ASSETS` hops.
///
/// Every hop pays slightly more than the fee takes, so the ring compounds to a small profit
/// and the detector has to run all `n - 1` passes before reporting it.
pub fn ring_graph() -> Result<ExchangeGraph, common::error::Error> {
    let rate = RING_GROSS_RATE * FEE_MULTIPLIER;
    let quotes = (0..RING_ASSETS)
        .map(|i| RateQuote::one_way(asset(i), asset((i + 1) % RING_ASSETS), rate));
    ExchangeGraph::from_quotes(quotes)
}

/// Complete graph of mutually consistent cross rates with a fee on every hop: no arbitrage.
///
/// Prices vary slightly by index so no two assets share a rate.
pub fn consistent_graph() -> Result<ExchangeGraph, common::error::Error> {
    let prices: Vec<(AssetId, f64)> = (1..=CONSISTENT_ASSETS)
        .map(|i| (asset(i), 1.0 + (i as f64) * 0.731))
        .collect();

    let quotes = cross_rate_quotes(&asset(0), &prices)?
        .into_iter()
        .flat_map(|quote| {
            [
                RateQuote::one_way(
                    quote.from.clone(),
                    quote.to.clone(),
                    quote.rate * FEE_MULTIPLIER,
                ),
                RateQuote::one_way(quote.to, quote.from, quote.rate.recip() * FEE_MULTIPLIER),
            ]
        });

    ExchangeGraph::from_quotes(quotes)
}
