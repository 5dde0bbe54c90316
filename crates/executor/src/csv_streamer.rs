use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;
use tokio::time::{self, Duration};
use tracing::{error, info};

use super::error::Error;
use super::types::UpdateStreamer;
use common::types::{RateQuote, RateSnapshot, Reciprocity};

// Helper struct for CSV parsing
#[derive(Debug, Deserialize, Default)]
pub struct CsvRecord {
    #[serde(rename = "from")]
    pub from_asset: String,

    #[serde(rename = "to")]
    pub to_asset: String,

    #[serde(rename = "rate")]
    pub rate_value: f64,

    #[serde(default)]
    pub invertible: bool,

    /// Rows sharing a snapshot id (consecutively) form one snapshot.
    #[serde(default)]
    pub snapshot: u64,
}

impl From<CsvRecord> for RateQuote {
    fn from(record: CsvRecord) -> Self {
        RateQuote {
            from: record.from_asset.into(),
            to: record.to_asset.into(),
            rate: record.rate_value,
            reciprocity: if record.invertible {
                Reciprocity::Invertible
            } else {
                Reciprocity::OneWay
            },
        }
    }
}

/// Replays rate snapshots recorded in a CSV file.
///
/// Expected header: `from,to,rate` with optional `invertible` and `snapshot` columns. Rates are not
/// validated here; the writer rejects a snapshot containing an invalid rate as a whole.
pub struct CsvStreamer {
    path: PathBuf,
    snapshot_interval: Duration,
}

impl CsvStreamer {
    pub fn new(path: PathBuf, snapshot_interval_ms: u64) -> Self {
        CsvStreamer {
            path,
            snapshot_interval: Duration::from_millis(snapshot_interval_ms),
        }
    }

    fn parse_csv_to_snapshots(&self) -> Result<Vec<RateSnapshot>, Error> {
        let file = File::open(&self.path).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "Failed to read file");
            Error::IoError(e)
        })?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut snapshots: Vec<RateSnapshot> = Vec::new();
        let mut current_id: Option<u64> = None;

        for result in rdr.deserialize() {
            let record: CsvRecord = result?;

            if current_id != Some(record.snapshot) {
                current_id = Some(record.snapshot);
                snapshots.push(Vec::new());
            }

            if let Some(snapshot) = snapshots.last_mut() {
                snapshot.push(record.into());
            }
        }
        Ok(snapshots)
    }
}

#[async_trait::async_trait]
impl UpdateStreamer for CsvStreamer {
    async fn run_stream(self, sender: Sender<RateSnapshot>) -> Result<(), Error> {
        let snapshots = self.parse_csv_to_snapshots()?;
        let total = snapshots.len();

        info!(snapshots = total, "CsvStreamer: Starting replay");

        for (i, snapshot) in snapshots.into_iter().enumerate() {
            if i > 0 {
                time::sleep(self.snapshot_interval).await;
            }

            let quotes = snapshot.len();
            if let Err(e) = sender.send(snapshot).await {
                error!(error = %e, "CsvStreamer shutting down: Writer receiver dropped during send.");
                return Err(Error::ChannelSendFailed);
            }
            info!(snapshot = i + 1, total, quotes, "CsvStreamer: Snapshot sent");
        }

        info!(snapshots = total, "CsvStreamer: Replay finished");
        Ok(())
    }
}
