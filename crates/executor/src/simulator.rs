use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use super::config::SimulatorConfig;
use super::error::Error;
use super::types::UpdateStreamer;
use arb_detector_core::cross_rate_quotes;
use common::types::{AssetId, RateQuote, RateSnapshot, Reciprocity};

/// Basis points per unit.
const BPS: f64 = 10_000.0;

/// Produces synthetic rate snapshots for simulation purposes.
///
/// Ticker prices follow a random walk. Each snapshot derives the consistent cross rates between
/// all assets and the quote asset, then quotes every direction separately with an independent
/// random skew of up to `spread_bps`. Skews that favour every hop of a loop (both directions of
/// a pair, or all sides of a triangle) show up downstream as arbitrage cycles.
pub struct SimulatorStreamer {
    config: SimulatorConfig,
    rng: SmallRng,
}

impl SimulatorStreamer {
    pub fn new(config: SimulatorConfig) -> Self {
        match config.seed {
            Some(seed) => Self::with_seed(config, seed),
            None => Self {
                config,
                rng: SmallRng::from_os_rng(),
            },
        }
    }

    /// Simulator with a fixed seed, for reproducible runs.
    pub fn with_seed(config: SimulatorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn initial_prices(&self) -> Vec<(AssetId, f64)> {
        self.config
            .assets
            .iter()
            .map(|asset| (AssetId::from(asset.symbol.as_str()), asset.price))
            .collect()
    }

    /// Moves every price by a random step of up to `volatility_bps`.
    fn step_prices(&mut self, prices: &mut [(AssetId, f64)]) {
        let step = self.config.volatility_bps / BPS;
        if step <= 0.0 {
            return;
        }
        for (_, price) in prices.iter_mut() {
            *price *= 1.0 + self.rng.random_range(-step..=step);
        }
    }

    /// Builds one complete snapshot from the current prices.
    fn snapshot(&mut self, prices: &[(AssetId, f64)]) -> Result<RateSnapshot, Error> {
        let quote_asset = AssetId::from(self.config.quote_asset.as_str());
        let spread = self.config.spread_bps / BPS;

        let fair_quotes = cross_rate_quotes(&quote_asset, prices)?;
        let mut snapshot = Vec::with_capacity(fair_quotes.len() * 2);

        for quote in fair_quotes {
            let forward = quote.rate * self.skew(spread);
            let backward = quote.rate.recip() * self.skew(spread);

            snapshot.push(RateQuote::one_way(quote.from.clone(), quote.to.clone(), forward));
            snapshot.push(RateQuote {
                from: quote.to,
                to: quote.from,
                rate: backward,
                reciprocity: Reciprocity::OneWay,
            });
        }

        Ok(snapshot)
    }

    fn skew(&mut self, spread: f64) -> f64 {
        if spread <= 0.0 {
            1.0
        } else {
            1.0 + self.rng.random_range(-spread..=spread)
        }
    }
}

#[async_trait]
impl UpdateStreamer for SimulatorStreamer {
    /// Runs the simulation asynchronously.
    ///
    /// Sends one snapshot per tick via the provided `Sender`. Backpressure is handled
    /// naturally via awaiting on `sender.send()`. Exits with `ChannelSendFailed`
    /// once the receiver is dropped.
    async fn run_stream(mut self, sender: Sender<RateSnapshot>) -> Result<(), Error> {
        let mut interval = time::interval(Duration::from_millis(self.config.interval_ms));
        let mut prices = self.initial_prices();

        info!(
            assets = prices.len(),
            quote_asset = %self.config.quote_asset,
            "Simulator started"
        );

        loop {
            interval.tick().await;

            self.step_prices(&mut prices);
            let snapshot = self.snapshot(&prices)?;

            debug!(quotes = snapshot.len(), "Simulator sent snapshot.");
            if sender.send(snapshot).await.is_err() {
                info!("Simulator shutting down: Writer receiver dropped.");
                return Err(Error::ChannelSendFailed);
            }
        }
    }
}
