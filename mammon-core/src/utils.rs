use std::fs::File;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{difficulty::BlockSample, network::Network};

pub trait Saveable
where
    Self: Sized,
{
    fn load<I: Read>(reader: I) -> IoResult<Self>;
    fn save<O: Write>(&self, writer: O) -> IoResult<()>;
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let file = File::create(&path)?;
        self.save(file)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let file = File::open(&path)?;
        Self::load(file)
    }
}

/// Trailing block samples handed to the estimator by tools, oldest first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BlockWindow {
    #[serde(default)]
    pub network: Network,
    /// Height of the first sample in `samples`.
    #[serde(default)]
    pub start_height: u64,
    pub samples: Vec<BlockSample>,
}

impl BlockWindow {
    pub fn new(network: Network, start_height: u64, samples: Vec<BlockSample>) -> Self {
        BlockWindow {
            network,
            start_height,
            samples,
        }
    }

    /// Evenly spaced samples of constant difficulty ending at `end`. When the
    /// span is longer than `end` the first sample sits at zero instead.
    ///
    /// Fails if `spacing * (count - 1)` does not fit in a timestamp.
    pub fn synthetic(
        network: Network,
        count: usize,
        spacing: u64,
        difficulty: u64,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let end = end.timestamp().max(0) as u64;
        let span = spacing
            .checked_mul(count.saturating_sub(1) as u64)
            .ok_or_else(|| {
                anyhow!(
                    "{} samples spaced {}s apart overflow the timestamp range",
                    count,
                    spacing
                )
            })?;
        let start = end.saturating_sub(span);
        // start + span <= max(end, span), so no sample timestamp overflows.
        let samples = (0..count as u64)
            .map(|i| BlockSample::new(start + i * spacing, difficulty))
            .collect();
        Ok(BlockWindow::new(network, 0, samples))
    }

    /// Height of the block that would follow the last sample, saturating at
    /// `u64::MAX`.
    pub fn next_height(&self) -> u64 {
        self.start_height.saturating_add(self.samples.len() as u64)
    }
}

impl Saveable for BlockWindow {
    fn load<I: Read>(reader: I) -> IoResult<Self> {
        serde_json::from_reader(reader).map_err(|e| {
            IoError::new(
                IoErrorKind::InvalidData,
                format!("Failed to deserialize BlockWindow: {}", e),
            )
        })
    }

    fn save<O: Write>(&self, writer: O) -> IoResult<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            IoError::new(
                IoErrorKind::InvalidData,
                format!("Failed to serialize BlockWindow: {}", e),
            )
        })
    }
}

pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_synthetic_window_spacing() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let window = BlockWindow::synthetic(Network::Testnet, 61, 120, 1000, end).unwrap();
        assert_eq!(window.samples.len(), 61);
        assert_eq!(window.samples[0].timestamp, 1_700_000_000 - 7200);
        assert_eq!(window.samples[60].timestamp, 1_700_000_000);
        assert!(window.samples.iter().all(|s| s.difficulty == 1000));
        assert_eq!(window.next_height(), 61);
    }

    #[test]
    fn test_synthetic_window_rejects_overflowing_span() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(BlockWindow::synthetic(Network::Mainnet, 3, u64::MAX / 2 + 1, 1, end).is_err());
        assert!(BlockWindow::synthetic(Network::Mainnet, 2, u64::MAX, 1, end).is_ok());
    }

    #[test]
    fn test_synthetic_window_longer_than_end_starts_at_zero() {
        let end = Utc.timestamp_opt(1000, 0).unwrap();
        let window = BlockWindow::synthetic(Network::Mainnet, 3, u64::MAX / 2, 7, end).unwrap();
        assert_eq!(window.samples[0].timestamp, 0);
        assert_eq!(window.samples[2].timestamp, u64::MAX - 1);
    }

    #[test]
    fn test_next_height_saturates() {
        let json = r#"{"start_height":18446744073709551615,"samples":[{"timestamp":1,"difficulty":1}]}"#;
        let window = BlockWindow::load(json.as_bytes()).unwrap();
        assert_eq!(window.next_height(), u64::MAX);
    }

    #[test]
    fn test_block_window_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.json");
        let window = BlockWindow::new(
            Network::Mainnet,
            1200,
            vec![BlockSample::new(10, 5), BlockSample::new(130, 6)],
        );
        window.save_to_file(&path).unwrap();

        let loaded = BlockWindow::load_from_file(&path).unwrap();
        assert_eq!(loaded, window);
        assert_eq!(loaded.next_height(), 1202);
    }

    #[test]
    fn test_block_window_defaults_and_errors() {
        let json = r#"{ "samples": [ { "timestamp": 1, "difficulty": 2 } ] }"#;
        let window = BlockWindow::load(json.as_bytes()).unwrap();
        assert_eq!(window.network, Network::Mainnet);
        assert_eq!(window.start_height, 0);

        let err = BlockWindow::load("{ \"samples\": 3 }".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), IoErrorKind::InvalidData);
    }
}
