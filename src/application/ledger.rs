use super::engine::WalletEngine;
use crate::domain::money::Amount;
use crate::domain::ports::{Sequence, UnitOfWork};
use crate::domain::transaction::{Transaction, TransactionType};
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use chrono::Utc;
use rust_decimal::Decimal;

pub(crate) async fn require_user(unit: &mut dyn UnitOfWork, id: UserId) -> Result<User> {
    unit.user(id)
        .await?
        .ok_or_else(|| WalletError::NotFound(format!("User {id}")))
}

/// The stored wallet of `user`, or a fresh empty one (not yet staged).
pub(crate) async fn wallet_or_new(unit: &mut dyn UnitOfWork, user: UserId) -> Result<Wallet> {
    Ok(unit.wallet(user).await?.unwrap_or_else(|| Wallet::new(user)))
}

/// The only path that changes a balance.
///
/// Applies both deltas and appends the matching transaction within `unit`.
/// Fails with `InsufficientFunds`, staging nothing, if a balance would go
/// negative.
pub(crate) async fn record(
    unit: &mut dyn UnitOfWork,
    user: UserId,
    r#type: TransactionType,
    amount_local: Option<Decimal>,
    amount_z: Option<Decimal>,
    description: String,
) -> Result<Transaction> {
    let mut wallet = wallet_or_new(unit, user).await?;
    wallet.apply(amount_local, amount_z)?;

    let tx = Transaction {
        id: unit.next_id(Sequence::Transaction).await?,
        user,
        r#type,
        amount_local,
        amount_z,
        description,
        created_at: Utc::now(),
    };
    unit.put_wallet(wallet).await?;
    unit.append_transaction(tx.clone()).await?;
    Ok(tx)
}

/// Result of comparing a wallet against the sum of its transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub wallet: Wallet,
    pub ledger_local: Decimal,
    pub ledger_z: Decimal,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.wallet.balance_local.value() == self.ledger_local
            && self.wallet.balance_z.value() == self.ledger_z
    }
}

impl WalletEngine {
    /// Returns the user's wallet, creating an empty one on first access.
    pub async fn get_or_create_wallet(&self, user: UserId) -> Result<Wallet> {
        let mut unit = self.store.begin().await?;
        require_user(unit.as_mut(), user).await?;
        if let Some(wallet) = unit.wallet(user).await? {
            return Ok(wallet);
        }

        let wallet = Wallet::new(user);
        unit.put_wallet(wallet.clone()).await?;
        unit.commit().await?;
        tracing::debug!(user, "wallet created");
        Ok(wallet)
    }

    /// Applies a pair of balance deltas with its transaction as one unit.
    pub async fn record(
        &self,
        user: UserId,
        r#type: TransactionType,
        amount_local: Option<Decimal>,
        amount_z: Option<Decimal>,
        description: impl Into<String>,
    ) -> Result<Transaction> {
        let mut unit = self.store.begin().await?;
        require_user(unit.as_mut(), user).await?;
        let tx = record(
            unit.as_mut(),
            user,
            r#type,
            amount_local,
            amount_z,
            description.into(),
        )
        .await?;
        unit.commit().await?;
        Ok(tx)
    }

    /// Simulated manual top-up of the local balance.
    pub async fn deposit_local(&self, user: UserId, amount_local: Decimal) -> Result<Transaction> {
        let amount = Amount::new(amount_local)?;
        let tx = self
            .record(
                user,
                TransactionType::Deposit,
                Some(amount.value()),
                None,
                "Manual deposit (simulation)",
            )
            .await?;
        tracing::info!(user, amount = %amount.value(), "local balance deposited");
        Ok(tx)
    }

    /// Wallet history, newest first. `limit` defaults to the configured
    /// history size.
    pub async fn transactions(&self, user: UserId, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let mut unit = self.store.begin().await?;
        let mut txs = unit.transactions(user).await?;
        txs.reverse();
        txs.truncate(limit.unwrap_or(self.config.history_limit));
        Ok(txs)
    }

    /// Every transaction of every user in ascending id order.
    pub async fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut unit = self.store.begin().await?;
        unit.all_transactions().await
    }

    /// Every wallet ordered by user.
    pub async fn wallets(&self) -> Result<Vec<Wallet>> {
        let mut unit = self.store.begin().await?;
        unit.wallets().await
    }

    /// Sums the user's transaction deltas for comparison with the stored
    /// balances.
    pub async fn reconcile(&self, user: UserId) -> Result<Reconciliation> {
        let mut unit = self.store.begin().await?;
        let wallet = wallet_or_new(unit.as_mut(), user).await?;
        let txs = unit.transactions(user).await?;
        let ledger_local = txs.iter().filter_map(|tx| tx.amount_local).sum();
        let ledger_z = txs.iter().filter_map(|tx| tx.amount_z).sum();
        Ok(Reconciliation {
            wallet,
            ledger_local,
            ledger_z,
        })
    }
}
