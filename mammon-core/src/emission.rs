//! Block reward schedule and the miner/treasury/insurance fee split.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::currency::Amount;

/// Whole-MAM block reward for each of the first four years.
const YEARLY_REWARDS_MAM: [u64; 4] = [100, 75, 50, 25];
/// Perpetual reward once the yearly schedule has run out.
const TAIL_REWARD_MAM: u64 = 10;

pub fn block_reward_mam(block_height: u64, blocks_per_year: u64) -> u64 {
    let year = block_height.checked_div(blocks_per_year).unwrap_or(u64::MAX);
    usize::try_from(year)
        .ok()
        .and_then(|year| YEARLY_REWARDS_MAM.get(year))
        .copied()
        .unwrap_or(TAIL_REWARD_MAM)
}

pub fn block_reward(block_height: u64, blocks_per_year: u64) -> Amount {
    Amount::from_atomic(block_reward_mam(block_height, blocks_per_year) * Amount::COIN)
}

/// Whole MAM emitted by heights `0..height`.
///
/// Counted in whole coins: a year of emission does not fit in 64 bits of
/// atomic units.
pub fn supply_at_height(height: u64, blocks_per_year: u64) -> Result<u64> {
    if blocks_per_year == 0 {
        return Err(anyhow!("blocks_per_year must be greater than zero"));
    }
    let mut supply = 0u64;
    let mut start = 0u64;
    while start < height {
        let end = start.saturating_add(blocks_per_year).min(height);
        let period = block_reward_mam(start, blocks_per_year)
            .checked_mul(end - start)
            .ok_or_else(|| anyhow!("Emission overflow at height {}", start))?;
        supply = supply
            .checked_add(period)
            .ok_or_else(|| anyhow!("Supply overflow at height {}", end))?;
        start = end;
    }
    Ok(supply)
}

fn percent_of(value: u64, percent: u64) -> u64 {
    (value as u128 * percent as u128 / 100) as u64
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeePercents {
    pub miner: u64,
    pub treasury: u64,
    pub insurance: u64,
}

impl FeePercents {
    pub fn is_complete(&self) -> bool {
        self.miner
            .checked_add(self.treasury)
            .and_then(|sum| sum.checked_add(self.insurance))
            == Some(100)
    }
}

impl Default for FeePercents {
    fn default() -> Self {
        FeePercents {
            miner: crate::MINER_FEE_PERCENT,
            treasury: crate::TREASURY_FEE_PERCENT,
            insurance: crate::INSURANCE_FEE_PERCENT,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    pub miner: Amount,
    pub treasury: Amount,
    pub insurance: Amount,
}

impl FeeSplit {
    /// Splits `total` by percentage. Rounding dust goes to the miner, so the
    /// three parts always add up to `total`.
    pub fn calculate(total: Amount, percents: &FeePercents) -> Result<Self> {
        let miner = total.mul_div(percents.miner, 100)?;
        let treasury = total.mul_div(percents.treasury, 100)?;
        let insurance = total.mul_div(percents.insurance, 100)?;

        let distributed = ((miner + treasury)? + insurance)?;
        let remainder = (total - distributed)
            .map_err(|_| anyhow!("Fee percentages distribute more than {}", total))?;

        Ok(FeeSplit {
            miner: (miner + remainder)?,
            treasury,
            insurance,
        })
    }
}

/// One row of the projected emission table, in whole MAM.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EmissionYear {
    pub year: u64,
    pub block_reward: u64,
    pub annual_emission: u64,
    pub total_supply: u64,
    pub treasury_annual: u64,
    pub treasury_total: u64,
    pub insurance_annual: u64,
    pub insurance_total: u64,
}

pub fn emission_schedule(
    years: u64,
    blocks_per_year: u64,
    percents: &FeePercents,
) -> Result<Vec<EmissionYear>> {
    let mut rows = Vec::new();
    let mut total_supply = 0u64;
    let mut treasury_total = 0u64;
    let mut insurance_total = 0u64;

    for year in 1..=years {
        let first_height = (year - 1)
            .checked_mul(blocks_per_year)
            .ok_or_else(|| anyhow!("Height overflow at year {}", year))?;
        let block_reward = block_reward_mam(first_height, blocks_per_year);
        let annual_emission = block_reward
            .checked_mul(blocks_per_year)
            .ok_or_else(|| anyhow!("Emission overflow at year {}", year))?;
        // Percentages of at most 100 cannot exceed the annual emission.
        let treasury_annual = percent_of(annual_emission, percents.treasury.min(100));
        let insurance_annual = percent_of(annual_emission, percents.insurance.min(100));

        total_supply = total_supply
            .checked_add(annual_emission)
            .ok_or_else(|| anyhow!("Supply overflow at year {}", year))?;
        treasury_total = treasury_total.saturating_add(treasury_annual);
        insurance_total = insurance_total.saturating_add(insurance_annual);

        rows.push(EmissionYear {
            year,
            block_reward,
            annual_emission,
            total_supply,
            treasury_annual,
            treasury_total,
            insurance_annual,
            insurance_total,
        });
    }

    Ok(rows)
}
