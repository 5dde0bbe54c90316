use thiserror::Error;

use crate::types::AssetId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A quote carried a rate that is zero, negative, NaN or infinite.
    #[error("Invalid rate {rate} for {from} -> {to}: rates must be finite and greater than zero.")]
    InvalidRate { from: AssetId, to: AssetId, rate: f64 },

    /// Detection was requested from an asset that is not a node of the graph.
    #[error("Source asset {0} is not present in the exchange graph.")]
    UnknownSource(AssetId),

    /// Cross rates were requested for the quote asset against itself.
    #[error("Asset {0} is listed as its own quote asset.")]
    SelfLoop(AssetId),
}
