pub mod config;
pub mod currency;
pub mod difficulty;
pub mod emission;
pub mod network;
pub mod utils;

use uint::construct_uint;

construct_uint! {
   pub struct U256(4);
}

pub use difficulty::{
    calculate_next_difficulty, validate_timestamp, BlockSample, DifficultyParams,
};
pub use network::Network;

pub const DIFFICULTY_TARGET: u64 = 120; // 2 minutes in seconds
pub const DIFFICULTY_WINDOW: u64 = 60; // Blocks in the LWMA window

// Solve-time clamp bounds, as multiples of DIFFICULTY_TARGET.
pub const TIMESTAMP_MIN_MULTIPLIER: u64 = 7;
pub const TIMESTAMP_MAX_MULTIPLIER: u64 = 14;

pub const TESTNET_MIN_DIFFICULTY: u64 = 100;

pub const ATOMIC_UNIT_DECIMALS: u32 = 12; // 1 MAM = 10^12 atomic units
pub const BLOCKS_PER_YEAR: u64 = 262_980; // 365.25 days of 120-second blocks

pub const MINER_FEE_PERCENT: u64 = 85;
pub const TREASURY_FEE_PERCENT: u64 = 10;
pub const INSURANCE_FEE_PERCENT: u64 = 5;
