//! # Token Amounts
//!
//! Exact conversion between human decimal amounts and on-chain base units.
//!
//! # Examples
//!
//! ```
//! use rpc_probe::domain::value_objects::token_amount::TokenAmount;
//! use rust_decimal::Decimal;
//!
//! // 0.01 USDC (6 decimals) is 10_000 base units.
//! let amount = TokenAmount::new(Decimal::new(1, 2), 6);
//! assert_eq!(amount.to_base_units().unwrap().as_u64(), 10_000);
//! ```

use ethers::types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for amount conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Negative amounts cannot be transferred.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),

    /// The amount has more fractional digits than the token supports.
    #[error("amount {amount} has more than {decimals} fractional digits")]
    TooPrecise {
        /// The requested amount.
        amount: Decimal,
        /// The token decimals.
        decimals: u8,
    },

    /// The scaled amount does not fit in 256 bits, or a base-unit value does
    /// not fit in a decimal.
    #[error("amount out of range")]
    OutOfRange,
}

/// A human-readable token amount together with the token's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    amount: Decimal,
    decimals: u8,
}

impl TokenAmount {
    /// Creates an amount for a token with the given decimals.
    #[must_use]
    pub const fn new(amount: Decimal, decimals: u8) -> Self {
        Self { amount, decimals }
    }

    /// Creates an amount from raw base units.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::OutOfRange`] if the value cannot be represented
    /// as a decimal with `decimals` fractional digits.
    pub fn from_base_units(value: U256, decimals: u8) -> Result<Self, AmountError> {
        if value > U256::from(u128::MAX) {
            return Err(AmountError::OutOfRange);
        }
        let raw = i128::try_from(value.as_u128()).map_err(|_| AmountError::OutOfRange)?;
        let amount = Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
            .map_err(|_| AmountError::OutOfRange)?;
        Ok(Self { amount, decimals })
    }

    /// Returns the decimal amount.
    #[inline]
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the token decimals.
    #[inline]
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Converts to base units (`amount * 10^decimals`) without rounding.
    ///
    /// # Errors
    ///
    /// - [`AmountError::Negative`] for negative amounts
    /// - [`AmountError::TooPrecise`] if rounding would be required
    /// - [`AmountError::OutOfRange`] on 256-bit overflow
    pub fn to_base_units(&self) -> Result<U256, AmountError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(AmountError::Negative(self.amount));
        }

        let normalized = self.amount.normalize();
        let scale = normalized.scale();
        let decimals = u32::from(self.decimals);
        if scale > decimals {
            return Err(AmountError::TooPrecise {
                amount: self.amount,
                decimals: self.decimals,
            });
        }

        let mantissa = normalized.mantissa().unsigned_abs();
        let factor = U256::from(10u8)
            .checked_pow(U256::from(decimals - scale))
            .ok_or(AmountError::OutOfRange)?;
        U256::from(mantissa)
            .checked_mul(factor)
            .ok_or(AmountError::OutOfRange)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount.normalize())
    }
}

/// Formats base units for display, falling back to the raw integer when the
/// value does not fit in a decimal.
#[must_use]
pub fn format_units(value: U256, decimals: u8) -> String {
    match TokenAmount::from_base_units(value, decimals) {
        Ok(amount) => amount.to_string(),
        Err(_) => format!("{value} (base units)"),
    }
}
