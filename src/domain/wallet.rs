use super::money::{Balance, Currency};
use super::user::UserId;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents the dual-currency balances of one user.
///
/// Balances are only changed through [`Wallet::apply`], which the ledger
/// pairs with a transaction record in the same unit of work.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Wallet {
    /// The owner of the wallet.
    pub user: UserId,
    /// Local-currency balance.
    pub balance_local: Balance,
    /// Z-coin balance.
    pub balance_z: Balance,
}

impl Wallet {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            balance_local: Balance::ZERO,
            balance_z: Balance::ZERO,
        }
    }

    /// Applies both signed deltas, or neither if either balance would go
    /// negative.
    pub fn apply(&mut self, local: Option<Decimal>, z: Option<Decimal>) -> Result<()> {
        let balance_local = match local {
            Some(delta) => self.balance_local.apply(delta, Currency::Local)?,
            None => self.balance_local,
        };
        let balance_z = match z {
            Some(delta) => self.balance_z.apply(delta, Currency::Z)?,
            None => self.balance_z,
        };
        self.balance_local = balance_local;
        self.balance_z = balance_z;
        Ok(())
    }

    pub fn balance(&self, currency: Currency) -> Balance {
        match currency {
            Currency::Local => self.balance_local,
            Currency::Z => self.balance_z,
        }
    }
}
