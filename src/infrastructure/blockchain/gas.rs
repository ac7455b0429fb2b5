//! # Gas
//!
//! Gas-limit buffering and fee selection for legacy and EIP-1559 chains.
//!
//! Fees are quoted in wei as [`U256`] because that is what the node returns
//! and what typed transactions carry.

use super::client::TxPriority;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of recent blocks sampled by `eth_feeHistory`.
pub const FEE_HISTORY_BLOCKS: u64 = 10;

/// Reward percentiles sampled by `eth_feeHistory`, indexed by
/// [`TxPriority::percentile_index`].
pub const FEE_HISTORY_PERCENTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Fee parameters for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GasPrice {
    /// Single gas price, for chains without EIP-1559.
    Legacy {
        /// Gas price in wei.
        gas_price: U256,
    },
    /// Dynamic fee.
    Eip1559 {
        /// Fee cap in wei.
        max_fee_per_gas: U256,
        /// Tip cap in wei.
        max_priority_fee_per_gas: U256,
    },
}

impl GasPrice {
    /// Creates a legacy gas price.
    #[must_use]
    pub const fn legacy(gas_price: U256) -> Self {
        Self::Legacy { gas_price }
    }

    /// Creates an EIP-1559 gas price.
    #[must_use]
    pub const fn eip1559(max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        Self::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }

    /// Scales a node-quoted legacy price by the priority multiplier.
    #[must_use]
    pub fn legacy_for_priority(node_price: U256, priority: TxPriority) -> Self {
        let scaled = node_price.saturating_mul(U256::from(priority.legacy_multiplier_percent()))
            / U256::from(100u64);
        Self::legacy(scaled)
    }

    /// Worst-case price per gas unit.
    #[must_use]
    pub const fn effective_price(&self) -> U256 {
        match self {
            Self::Legacy { gas_price } => *gas_price,
            Self::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
        }
    }

    /// Returns whether this is an EIP-1559 fee.
    #[must_use]
    pub const fn is_eip1559(&self) -> bool {
        matches!(self, Self::Eip1559 { .. })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy { gas_price } => write!(f, "legacy: {gas_price} wei"),
            Self::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => write!(
                f,
                "eip1559: max_fee={max_fee_per_gas} wei, priority_fee={max_priority_fee_per_gas} wei"
            ),
        }
    }
}

/// Pads node gas estimates by a fixed percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimator {
    buffer_percent: u64,
}

impl GasEstimator {
    /// Default gas buffer percentage.
    pub const DEFAULT_BUFFER_PERCENT: u64 = 20;

    /// Creates an estimator adding `buffer_percent` to every estimate.
    #[must_use]
    pub const fn new(buffer_percent: u64) -> Self {
        Self { buffer_percent }
    }

    /// Returns the buffer percentage.
    #[must_use]
    pub const fn buffer_percent(&self) -> u64 {
        self.buffer_percent
    }

    /// Applies the buffer, saturating at `u64::MAX`.
    #[must_use]
    pub const fn apply_buffer(&self, estimate: u64) -> u64 {
        let padding = (estimate as u128 * self.buffer_percent as u128) / 100;
        let total = estimate as u128 + padding;
        if total > u64::MAX as u128 {
            u64::MAX
        } else {
            total as u64
        }
    }

    /// Worst-case cost of `gas_limit` units at `gas_price`, in wei.
    #[must_use]
    pub fn estimate_cost(&self, gas_limit: u64, gas_price: &GasPrice) -> U256 {
        U256::from(gas_limit).saturating_mul(gas_price.effective_price())
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUFFER_PERCENT)
    }
}

/// Recent base fees and reward percentiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeHistory {
    /// Base fee per gas, oldest block first.
    pub base_fees: Vec<U256>,
    /// Per-block rewards at [`FEE_HISTORY_PERCENTILES`].
    pub priority_fees: Vec<Vec<U256>>,
}

impl FeeHistory {
    /// Creates a fee history.
    #[must_use]
    pub fn new(base_fees: Vec<U256>, priority_fees: Vec<Vec<U256>>) -> Self {
        Self {
            base_fees,
            priority_fees,
        }
    }

    /// Twice the median base fee, or zero with no samples.
    #[must_use]
    pub fn recommended_max_fee(&self) -> U256 {
        median(self.base_fees.clone()).saturating_mul(U256::from(2u64))
    }

    /// Median reward at `percentile_index`, or zero with no samples.
    #[must_use]
    pub fn recommended_priority_fee(&self, percentile_index: usize) -> U256 {
        let fees = self
            .priority_fees
            .iter()
            .filter_map(|block| block.get(percentile_index).copied())
            .collect();
        median(fees)
    }

    /// EIP-1559 fee for `priority`: the tip is the median reward at the
    /// priority's percentile and the cap adds that tip to the recommended
    /// max fee.
    #[must_use]
    pub fn gas_price(&self, priority: TxPriority) -> GasPrice {
        let tip = self.recommended_priority_fee(priority.percentile_index());
        GasPrice::eip1559(self.recommended_max_fee().saturating_add(tip), tip)
    }
}

impl From<ethers::types::FeeHistory> for FeeHistory {
    fn from(history: ethers::types::FeeHistory) -> Self {
        Self::new(history.base_fee_per_gas, history.reward)
    }
}

fn median(mut values: Vec<U256>) -> U256 {
    values.sort_unstable();
    values.get(values.len() / 2).copied().unwrap_or_default()
}
