// mammon-tool main.rs
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use mammon_core::{config::ChainConfig, Network};
use std::path::PathBuf;

/// Difficulty, timestamp and emission calculator for the Mammon blockchain.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the chain configuration file.
    #[arg(short, long, default_value = "mammon.toml")]
    config: PathBuf,

    /// Use testnet rules regardless of the configured network.
    #[arg(long)]
    testnet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the difficulty the next block must satisfy.
    NextDifficulty {
        /// JSON file holding the trailing block samples, oldest first.
        #[arg(short, long)]
        samples: PathBuf,

        /// Height of the block being produced. Defaults to the one after the
        /// last sample.
        #[arg(long)]
        height: Option<u64>,
    },
    /// Check a proposed block timestamp against recent history.
    CheckTimestamp {
        #[arg(short, long)]
        samples: PathBuf,

        #[arg(short, long)]
        timestamp: u64,

        /// Wall-clock time to validate against. Defaults to now.
        #[arg(long)]
        now: Option<u64>,
    },
    /// Print the projected emission schedule.
    Emission {
        #[arg(short, long, default_value_t = 10)]
        years: u64,
    },
    /// Write an evenly spaced synthetic sample window.
    GenerateSamples {
        output: PathBuf,

        #[arg(long, default_value_t = 61)]
        count: usize,

        /// Seconds between samples. Defaults to the target block time.
        #[arg(long)]
        spacing: Option<u64>,

        #[arg(long, default_value_t = 1000)]
        difficulty: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = ChainConfig::load(&cli.config)?;
    if cli.testnet {
        config.network = Network::Testnet;
    }
    info!("Using {} rules", config.network);

    match cli.command {
        Command::NextDifficulty { samples, height } => {
            commands::next_difficulty(&config, &samples, height)
        }
        Command::CheckTimestamp {
            samples,
            timestamp,
            now,
        } => {
            if !commands::check_timestamp(&config, &samples, timestamp, now)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Emission { years } => commands::emission(&config, years),
        Command::GenerateSamples {
            output,
            count,
            spacing,
            difficulty,
        } => commands::generate_samples(&config, &output, count, spacing, difficulty),
    }
}
