use serde::{Deserialize, Serialize};
use std::fmt;

use crate::numeric_kernel::rate_from_weight;

/// Identifier of a tradable asset (e.g. `"BTC"`, `"USDT"`).
///
/// Compared byte-for-byte: no case folding or trimming is applied, so callers must supply
/// canonical symbols. Ordering is lexicographic and drives the detector's edge order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(symbol: impl Into<String>) -> Self {
        AssetId(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(symbol: &str) -> Self {
        AssetId(symbol.to_string())
    }
}

impl From<String> for AssetId {
    fn from(symbol: String) -> Self {
        AssetId(symbol)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the builder should also insert the reverse edge for a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reciprocity {
    /// Only `from -> to` is modeled.
    #[default]
    OneWay,
    /// `to -> from` is modeled as well, at `1 / rate`.
    Invertible,
}

/// A single pairwise rate: 1 unit of `from` buys `rate` units of `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub from: AssetId,
    pub to: AssetId,
    pub rate: f64,
    #[serde(default)]
    pub reciprocity: Reciprocity,
}

impl RateQuote {
    pub fn one_way(from: impl Into<AssetId>, to: impl Into<AssetId>, rate: f64) -> Self {
        RateQuote {
            from: from.into(),
            to: to.into(),
            rate,
            reciprocity: Reciprocity::OneWay,
        }
    }

    pub fn invertible(from: impl Into<AssetId>, to: impl Into<AssetId>, rate: f64) -> Self {
        RateQuote {
            from: from.into(),
            to: to.into(),
            rate,
            reciprocity: Reciprocity::Invertible,
        }
    }
}

/// A complete set of quotes taken at one moment. Consumers never see a partial snapshot.
pub type RateSnapshot = Vec<RateQuote>;

/// A profitable conversion loop.
///
/// `path[i]` converts into `path[(i + 1) % len]` at `rates[i]`; the last asset converts back into
/// the first, so no asset is repeated in `path`.
///
/// `log_rate_sum` holds `sum(-ln(rate_i))`, which is negative for a profitable loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageCycle {
    pub path: Vec<AssetId>,
    pub rates: Vec<f64>,
    pub log_rate_sum: f64,
}

impl ArbitrageCycle {
    /// Returns the compounded rate (∏ rate_i) for one trip around the loop.
    ///
    /// Recovered from the stored log sum: `product = e^(-sum(w_i))`.
    ///
    /// Example:
    /// ```text
    /// rates [2.0, 0.6] -> log_rate_sum = -ln(1.2) ≈ -0.1823
    /// product_rate = exp(0.1823) = 1.2
    /// ```
    pub fn product_rate(&self) -> f64 {
        rate_from_weight(self.log_rate_sum)
    }

    /// Returns true if the loop ends with more than it started (product_rate > 1.0).
    pub fn is_profitable(&self) -> bool {
        self.log_rate_sum < 0.0
    }

    /// Gain per trip around the loop, in percent.
    pub fn profit_percentage(&self) -> f64 {
        (self.product_rate() - 1.0) * 100.0
    }

    pub fn hop_count(&self) -> usize {
        self.rates.len()
    }
}

impl fmt::Display for ArbitrageCycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for asset in &self.path {
            write!(f, "{} → ", asset)?;
        }
        if let Some(first) = self.path.first() {
            write!(f, "{}", first)?;
        }
        write!(f, " (x{:.6})", self.product_rate())
    }
}

/// Outcome of a detection run, in the shape handed to presentation layers.
///
/// `cycle` is empty whenever `detected` is false.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DetectionResult {
    pub detected: bool,
    pub cycle: Vec<AssetId>,
}

impl From<Option<ArbitrageCycle>> for DetectionResult {
    fn from(cycle: Option<ArbitrageCycle>) -> Self {
        match cycle {
            Some(cycle) => DetectionResult {
                detected: true,
                cycle: cycle.path,
            },
            None => DetectionResult::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_hop_cycle() -> ArbitrageCycle {
        let rates: Vec<f64> = vec![2.0, 0.6];
        let log_rate_sum: f64 = rates.iter().map(|r| -r.ln()).sum();
        ArbitrageCycle {
            path: vec!["A".into(), "B".into()],
            rates,
            log_rate_sum,
        }
    }

    #[test]
    fn asset_ids_compare_exactly() {
        assert_ne!(AssetId::from("btc"), AssetId::from("BTC"));
        assert_ne!(AssetId::from("BTC "), AssetId::from("BTC"));
        assert!(AssetId::from("BTC") < AssetId::from("ETH"));
        assert_eq!(AssetId::new(String::from("ETH")).as_str(), "ETH");
    }

    #[test]
    fn quote_constructors_set_reciprocity() {
        assert_eq!(RateQuote::one_way("A", "B", 2.0).reciprocity, Reciprocity::OneWay);
        assert_eq!(
            RateQuote::invertible("A", "B", 2.0).reciprocity,
            Reciprocity::Invertible
        );
    }

    #[test]
    fn cycle_metrics() {
        let cycle = two_hop_cycle();

        assert!((cycle.product_rate() - 1.2).abs() < 1e-12);
        assert!((cycle.profit_percentage() - 20.0).abs() < 1e-9);
        assert!(cycle.is_profitable());
        assert_eq!(cycle.hop_count(), 2);
    }

    #[test]
    fn cycle_display_closes_the_loop() {
        assert_eq!(two_hop_cycle().to_string(), "A → B → A (x1.200000)");
    }

    #[test]
    fn detection_result_from_option() {
        let found = DetectionResult::from(Some(two_hop_cycle()));
        assert!(found.detected);
        assert_eq!(found.cycle, vec![AssetId::from("A"), AssetId::from("B")]);

        let none = DetectionResult::from(None);
        assert!(!none.detected);
        assert!(none.cycle.is_empty());
    }
}
