use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::ATOMIC_UNIT_DECIMALS;

/// A MAM amount held in atomic units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub const DECIMAL_PLACES: u32 = ATOMIC_UNIT_DECIMALS;
    pub const COIN: u64 = 10u64.pow(Self::DECIMAL_PLACES);

    pub const fn from_atomic(units: u64) -> Self {
        Amount(units)
    }

    pub fn from_mam(mam: u64) -> Result<Self> {
        mam.checked_mul(Self::COIN)
            .map(Amount)
            .ok_or_else(|| anyhow!("Overflow converting {} MAM to atomic units", mam))
    }

    pub fn as_atomic(&self) -> u64 {
        self.0
    }

    pub fn zero() -> Self {
        Amount(0)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Amount(self.0.saturating_add(other.0))
    }

    /// `self * numerator / denominator`, computed without intermediate overflow.
    pub fn mul_div(self, numerator: u64, denominator: u64) -> Result<Self> {
        if denominator == 0 {
            return Err(anyhow!("Division by zero scaling {}", self));
        }
        let scaled = self.0 as u128 * numerator as u128 / denominator as u128;
        u64::try_from(scaled)
            .map(Amount)
            .map_err(|_| anyhow!("Amount overflow scaling {} by {}/{}", self, numerator, denominator))
    }

    pub fn to_string_mam(&self) -> String {
        let whole = self.0 / Self::COIN;
        let fraction = self.0 % Self::COIN;
        if fraction == 0 {
            return whole.to_string();
        }
        let fraction_str = format!("{:0width$}", fraction, width = Self::DECIMAL_PLACES as usize);
        format!("{}.{}", whole, fraction_str.trim_end_matches('0'))
    }

    pub fn from_string_mam(s: &str) -> Result<Self> {
        let (whole_str, fraction_str) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        if whole_str.is_empty() && fraction_str.is_empty() {
            return Err(anyhow!("Empty amount '{}'", s));
        }
        if fraction_str.contains('.') {
            return Err(anyhow!("Invalid amount '{}': multiple decimal points", s));
        }
        if fraction_str.len() > Self::DECIMAL_PLACES as usize {
            return Err(anyhow!(
                "Too many decimal places in '{}'. Max {} allowed.",
                s,
                Self::DECIMAL_PLACES
            ));
        }

        let whole = if whole_str.is_empty() {
            0
        } else {
            whole_str
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid integer part in '{}': {}", s, e))?
        };
        let fraction = if fraction_str.is_empty() {
            0
        } else {
            let padded = format!(
                "{:0<width$}",
                fraction_str,
                width = Self::DECIMAL_PLACES as usize
            );
            padded
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid fractional part in '{}': {}", s, e))?
        };

        whole
            .checked_mul(Self::COIN)
            .and_then(|units| units.checked_add(fraction))
            .map(Amount)
            .ok_or_else(|| anyhow!("Amount '{}' overflows atomic units", s))
    }
}

impl Add for Amount {
    type Output = Result<Self>;
    fn add(self, other: Self) -> Self::Output {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or_else(|| anyhow!("Amount overflow: {} + {}", self, other))
    }
}

impl Sub for Amount {
    type Output = Result<Self>;
    fn sub(self, other: Self) -> Self::Output {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or_else(|| anyhow!("Amount underflow: {} - {}", self, other))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} MAM", self.to_string_mam())
    }
}
