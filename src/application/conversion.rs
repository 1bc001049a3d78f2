use super::engine::WalletEngine;
use super::ledger::{record, require_user, wallet_or_new};
use crate::domain::money::{Amount, MONEY_DP, checked, round2};
use crate::domain::ports::UnitOfWork;
use crate::domain::transaction::TransactionType;
use crate::domain::user::UserId;
use crate::error::{Result, WalletError};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fixed-rate conversion between local currency and Z.
///
/// Each conversion rounds once, after its single multiply or divide, so it is
/// off by at most half a rounding unit. Splitting an amount into several
/// conversions can credit a few units more or less than converting the total
/// at once; that difference is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converter {
    rate: Decimal,
}

impl Converter {
    /// `rate` is local-currency units per 1 Z.
    pub fn new(rate: Decimal) -> Result<Self> {
        if rate <= Decimal::ZERO {
            return Err(WalletError::ConfigError(format!(
                "exchange rate must be positive, got {rate}"
            )));
        }
        Ok(Self { rate })
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn to_z(&self, amount_local: Decimal) -> Result<Decimal> {
        checked(amount_local.checked_div(self.rate), "converted amount").map(round2)
    }

    pub fn to_local(&self, amount_z: Decimal) -> Result<Decimal> {
        checked(amount_z.checked_mul(self.rate), "converted amount").map(round2)
    }

    /// Smallest 2dp local amount whose [`Converter::to_z`] is at least
    /// `amount_z`.
    pub fn to_local_covering(&self, amount_z: Decimal) -> Result<Decimal> {
        let exact = checked(amount_z.checked_mul(self.rate), "converted amount")?;
        Ok(exact.round_dp_with_strategy(MONEY_DP, RoundingStrategy::AwayFromZero))
    }
}

/// Moves `amount_local` out of the local balance and credits its Z value,
/// recording one `convert_to_z` transaction. Returns the Z credited.
pub(crate) async fn convert_in_unit(
    unit: &mut dyn UnitOfWork,
    converter: &Converter,
    user: UserId,
    amount_local: Decimal,
    description: String,
) -> Result<Decimal> {
    let amount = Amount::new(amount_local)?.value();
    let wallet = wallet_or_new(unit, user).await?;
    if !wallet.balance_local.covers(amount) {
        return Err(WalletError::InvalidAmount(format!(
            "cannot convert {amount}, local balance is {}",
            wallet.balance_local
        )));
    }

    let z = converter.to_z(amount)?;
    if z <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(format!(
            "{amount} is below the smallest convertible amount"
        )));
    }

    record(
        unit,
        user,
        TransactionType::ConvertToZ,
        Some(-amount),
        Some(z),
        description,
    )
    .await?;
    tracing::debug!(user, local = %amount, z = %z, "converted local to Z");
    Ok(z)
}

impl WalletEngine {
    /// Converts part of a user's local balance to Z at the configured rate.
    pub async fn convert_local_to_z(&self, user: UserId, amount_local: Decimal) -> Result<Decimal> {
        let mut unit = self.store.begin().await?;
        require_user(unit.as_mut(), user).await?;
        let z = convert_in_unit(
            unit.as_mut(),
            &self.converter,
            user,
            amount_local,
            "Converted to Z coins".to_string(),
        )
        .await?;
        unit.commit().await?;
        Ok(z)
    }
}
