use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};
use mammon_core::{
    config::ChainConfig,
    emission::{block_reward, emission_schedule, EmissionYear, FeeSplit},
    utils::{unix_now, BlockWindow, Saveable},
};

fn load_window(config: &ChainConfig, path: &Path) -> Result<BlockWindow> {
    let window = BlockWindow::load_from_file(path)
        .with_context(|| format!("Failed to load block samples from {:?}", path))?;
    if window.network != config.network {
        warn!(
            "Samples in {:?} were recorded on {}, evaluating with {} rules",
            path, window.network, config.network
        );
    }
    Ok(window)
}

pub fn next_difficulty(config: &ChainConfig, samples: &Path, height: Option<u64>) -> Result<()> {
    let window = load_window(config, samples)?;
    let height = height.unwrap_or_else(|| window.next_height());
    let params = config.difficulty_params();

    let difficulty = params.next_difficulty(&window.samples, height, config.network);
    info!(
        "Computed difficulty for height {} from {} samples",
        height,
        window.samples.len()
    );
    println!("{}", difficulty);
    Ok(())
}

pub fn check_timestamp(
    config: &ChainConfig,
    samples: &Path,
    timestamp: u64,
    now: Option<u64>,
) -> Result<bool> {
    let window = load_window(config, samples)?;
    let now = now.unwrap_or_else(unix_now);
    let params = config.difficulty_params();

    let valid = params.is_timestamp_valid(timestamp, &window.samples, now);
    match params.median_timestamp(&window.samples) {
        Some(median) => info!(
            "Timestamp {} against median {} and now {}: {}",
            timestamp,
            median,
            now,
            if valid { "valid" } else { "invalid" }
        ),
        None => info!("No recent samples, timestamp {} accepted", timestamp),
    }
    println!("{}", if valid { "valid" } else { "invalid" });
    Ok(valid)
}

fn print_emission_table(rows: &[EmissionYear]) {
    println!(
        "{:>4}  {:>6}  {:>14}  {:>14}  {:>12}  {:>14}  {:>12}  {:>14}",
        "Year", "Reward", "Annual", "Supply", "Treasury", "Treasury sum", "Insurance", "Insurance sum"
    );
    for row in rows {
        println!(
            "{:>4}  {:>6}  {:>14}  {:>14}  {:>12}  {:>14}  {:>12}  {:>14}",
            row.year,
            row.block_reward,
            row.annual_emission,
            row.total_supply,
            row.treasury_annual,
            row.treasury_total,
            row.insurance_annual,
            row.insurance_total
        );
    }
}

pub fn emission(config: &ChainConfig, years: u64) -> Result<()> {
    if years == 0 {
        return Err(anyhow!("Emission table needs at least one year"));
    }
    let percents = config.fee_percents();
    let rows = emission_schedule(years, config.blocks_per_year, &percents)?;
    print_emission_table(&rows);

    let first_reward = block_reward(0, config.blocks_per_year);
    let split = FeeSplit::calculate(first_reward, &percents)?;
    println!();
    println!(
        "Year 1 block reward {}: miner {}, treasury {}, insurance {}",
        first_reward, split.miner, split.treasury, split.insurance
    );
    Ok(())
}

pub fn generate_samples(
    config: &ChainConfig,
    output: &Path,
    count: usize,
    spacing: Option<u64>,
    difficulty: u64,
) -> Result<()> {
    let spacing = spacing.unwrap_or(config.difficulty_target);
    let window = BlockWindow::synthetic(config.network, count, spacing, difficulty, Utc::now())?;
    window
        .save_to_file(output)
        .with_context(|| format!("Failed to save block samples to {:?}", output))?;
    info!(
        "Wrote {} samples spaced {}s apart to {:?}",
        count, spacing, output
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mammon_core::{BlockSample, Network};

    #[test]
    fn test_generate_then_next_difficulty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        let config = ChainConfig::default();
        generate_samples(&config, &path, 61, None, 1000).unwrap();

        let window = BlockWindow::load_from_file(&path).unwrap();
        let params = config.difficulty_params();
        assert_eq!(
            params.next_difficulty(&window.samples, window.next_height(), config.network),
            1000
        );
        assert!(next_difficulty(&config, &path, None).is_ok());
    }

    #[test]
    fn test_check_timestamp_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        let window = BlockWindow::new(
            Network::Mainnet,
            0,
            vec![
                BlockSample::new(100, 1),
                BlockSample::new(200, 1),
                BlockSample::new(300, 1),
            ],
        );
        window.save_to_file(&path).unwrap();

        let config = ChainConfig::default();
        assert!(!check_timestamp(&config, &path, 200, Some(1000)).unwrap());
        assert!(check_timestamp(&config, &path, 201, Some(1000)).unwrap());
        assert!(!check_timestamp(&config, &path, 2681, Some(1000)).unwrap());
    }

    #[test]
    fn test_generate_samples_rejects_overflowing_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        let config = ChainConfig::default();
        assert!(generate_samples(&config, &path, 3, Some(u64::MAX / 2 + 1), 1).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_samples_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChainConfig::default();
        assert!(next_difficulty(&config, &dir.path().join("missing.json"), None).is_err());
    }

    #[test]
    fn test_emission_requires_years() {
        let config = ChainConfig::default();
        assert!(emission(&config, 0).is_err());
        assert!(emission(&config, 5).is_ok());
    }
}
