use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    difficulty::DifficultyParams, emission::FeePercents, network::Network, BLOCKS_PER_YEAR,
    DIFFICULTY_TARGET, DIFFICULTY_WINDOW, INSURANCE_FEE_PERCENT, MINER_FEE_PERCENT,
    TESTNET_MIN_DIFFICULTY, TIMESTAMP_MAX_MULTIPLIER, TIMESTAMP_MIN_MULTIPLIER,
    TREASURY_FEE_PERCENT,
};

/// Chain parameters as read from a TOML file. Every node on a network must
/// agree on these values.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    #[serde(default)]
    pub network: Network,

    #[serde(default = "default_difficulty_target")]
    pub difficulty_target: u64,

    #[serde(default = "default_difficulty_window")]
    pub difficulty_window: u64,

    #[serde(default = "default_timestamp_min_multiplier")]
    pub timestamp_min_multiplier: u64,

    #[serde(default = "default_timestamp_max_multiplier")]
    pub timestamp_max_multiplier: u64,

    #[serde(default = "default_testnet_min_difficulty")]
    pub testnet_min_difficulty: u64,

    #[serde(default = "default_blocks_per_year")]
    pub blocks_per_year: u64,

    #[serde(default = "default_miner_fee_percent")]
    pub miner_fee_percent: u64,

    #[serde(default = "default_treasury_fee_percent")]
    pub treasury_fee_percent: u64,

    #[serde(default = "default_insurance_fee_percent")]
    pub insurance_fee_percent: u64,
}

fn default_difficulty_target() -> u64 {
    DIFFICULTY_TARGET
}
fn default_difficulty_window() -> u64 {
    DIFFICULTY_WINDOW
}
fn default_timestamp_min_multiplier() -> u64 {
    TIMESTAMP_MIN_MULTIPLIER
}
fn default_timestamp_max_multiplier() -> u64 {
    TIMESTAMP_MAX_MULTIPLIER
}
fn default_testnet_min_difficulty() -> u64 {
    TESTNET_MIN_DIFFICULTY
}
fn default_blocks_per_year() -> u64 {
    BLOCKS_PER_YEAR
}
fn default_miner_fee_percent() -> u64 {
    MINER_FEE_PERCENT
}
fn default_treasury_fee_percent() -> u64 {
    TREASURY_FEE_PERCENT
}
fn default_insurance_fee_percent() -> u64 {
    INSURANCE_FEE_PERCENT
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            network: Network::default(),
            difficulty_target: default_difficulty_target(),
            difficulty_window: default_difficulty_window(),
            timestamp_min_multiplier: default_timestamp_min_multiplier(),
            timestamp_max_multiplier: default_timestamp_max_multiplier(),
            testnet_min_difficulty: default_testnet_min_difficulty(),
            blocks_per_year: default_blocks_per_year(),
            miner_fee_percent: default_miner_fee_percent(),
            treasury_fee_percent: default_treasury_fee_percent(),
            insurance_fee_percent: default_insurance_fee_percent(),
        }
    }
}

impl ChainConfig {
    /// Reads the config at `path`, or the defaults if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("Failed to parse chain config {:?}", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Chain config {:?} not found, using defaults", path);
                ChainConfig::default()
            }
            Err(e) => {
                return Err(anyhow!("Failed to read chain config {:?}: {}", path, e));
            }
        };
        config.validate()?;
        info!(
            "Loaded {} chain config: T={}s N={}",
            config.network, config.difficulty_target, config.difficulty_window
        );
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize chain config to TOML")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write chain config {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty_target == 0 {
            return Err(anyhow!("difficulty_target must be greater than zero"));
        }
        if self.difficulty_window == 0 {
            return Err(anyhow!("difficulty_window must be greater than zero"));
        }
        if self.blocks_per_year == 0 {
            return Err(anyhow!("blocks_per_year must be greater than zero"));
        }
        let fees = self.fee_percents();
        if !fees.is_complete() {
            return Err(anyhow!(
                "Fee percentages must sum to 100, got {} + {} + {}",
                fees.miner,
                fees.treasury,
                fees.insurance
            ));
        }
        Ok(())
    }

    pub fn difficulty_params(&self) -> DifficultyParams {
        DifficultyParams::from_multipliers(
            self.difficulty_window,
            self.difficulty_target,
            self.timestamp_min_multiplier,
            self.timestamp_max_multiplier,
            self.testnet_min_difficulty,
        )
    }

    pub fn fee_percents(&self) -> FeePercents {
        FeePercents {
            miner: self.miner_fee_percent,
            treasury: self.treasury_fee_percent,
            insurance: self.insurance_fee_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_params() {
        let config = ChainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.difficulty_params(), DifficultyParams::reference());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ChainConfig = toml::from_str(
            r#"
            network = "testnet"
            difficulty_window = 45
            "#,
        )
        .unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.difficulty_window, 45);
        assert_eq!(config.difficulty_target, 120);

        let params = config.difficulty_params();
        assert_eq!(params.window, 45);
        assert_eq!(params.timestamp_min, -840);
        assert_eq!(params.timestamp_max, 1680);
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut config = ChainConfig::default();
        config.difficulty_target = 0;
        assert!(config.validate().is_err());

        let mut config = ChainConfig::default();
        config.difficulty_window = 0;
        assert!(config.validate().is_err());

        let mut config = ChainConfig::default();
        config.treasury_fee_percent = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChainConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ChainConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mammon.toml");
        let mut config = ChainConfig::default();
        config.network = Network::Testnet;
        config.testnet_min_difficulty = 250;
        config.save(&path).unwrap();

        let loaded = ChainConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mammon.toml");
        std::fs::write(&path, "difficulty_target = \"fast\"").unwrap();
        assert!(ChainConfig::load(&path).is_err());

        std::fs::write(&path, "difficulty_window = 0").unwrap();
        assert!(ChainConfig::load(&path).is_err());
    }
}
