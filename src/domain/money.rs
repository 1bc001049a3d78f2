use crate::error::{Result, WalletError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

/// Number of decimal places every stored amount is rounded to.
pub const MONEY_DP: u32 = 2;

/// Rounds half-up to 2 decimal places.
///
/// Applied once at every conversion boundary so repeated conversions never
/// accumulate sub-cent drift.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Unwraps a checked `Decimal` operation, reporting overflow as
/// `InvalidAmount`.
pub fn checked(value: Option<Decimal>, what: &str) -> Result<Decimal> {
    value.ok_or_else(|| WalletError::InvalidAmount(format!("{what} is out of range")))
}

/// The two currencies a wallet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Real-world currency backing deposits and withdrawals.
    Local,
    /// Internal platform credit used to price course content.
    Z,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Local => write!(f, "local"),
            Currency::Z => write!(f, "Z"),
        }
    }
}

/// A non-negative wallet balance.
///
/// The only way to lower a balance is [`Balance::apply`], which refuses to go
/// below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(Decimal);

/// Represents a positive monetary amount for an operation.
///
/// Ensures that requested amounts are always positive and carry no more
/// than [`MONEY_DP`] decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(format!(
                "amount must be positive, got {value}"
            )));
        }
        if value.normalize().scale() > MONEY_DP {
            return Err(WalletError::InvalidAmount(format!(
                "amount has more than {MONEY_DP} decimal places: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Applies a signed delta, returning the new balance or `InsufficientFunds`
    /// if it would drop below zero.
    pub fn apply(self, delta: Decimal, currency: Currency) -> Result<Self> {
        let next = checked(self.0.checked_add(delta), "balance")?;
        if next < Decimal::ZERO {
            return Err(WalletError::InsufficientFunds {
                currency,
                available: self.0,
                required: -delta,
            });
        }
        Ok(Self(next))
    }

    pub fn covers(&self, amount: Decimal) -> bool {
        self.0 >= amount
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Sub<Balance> for Decimal {
    type Output = Decimal;
    fn sub(self, rhs: Balance) -> Decimal {
        self - rhs.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
