use super::records::Records;
use crate::domain::catalog::{CoursePart, Enrollment, PartId};
use crate::domain::payment_order::{OrderId, PaymentOrder};
use crate::domain::ports::{LedgerStore, Sequence, UnitOfWork, UnitOfWorkBox};
use crate::domain::settings::SitePaymentSettings;
use crate::domain::transaction::Transaction;
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A thread-safe in-memory ledger store.
///
/// Uses `Arc<Mutex<Records>>`; a unit of work owns the lock for its whole
/// lifetime, which serializes units against each other.
/// Ideal for testing or small datasets where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    records: Arc<Mutex<Records>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        let committed = Arc::clone(&self.records).lock_owned().await;
        Ok(Box::new(InMemoryUnit {
            committed,
            staged: Records::default(),
        }))
    }
}

struct InMemoryUnit {
    committed: OwnedMutexGuard<Records>,
    staged: Records,
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn wallet(&mut self, user: UserId) -> Result<Option<Wallet>> {
        Ok(self
            .staged
            .wallets
            .get(&user)
            .or_else(|| self.committed.wallets.get(&user))
            .cloned())
    }

    async fn put_wallet(&mut self, wallet: Wallet) -> Result<()> {
        self.staged.wallets.insert(wallet.user, wallet);
        Ok(())
    }

    async fn wallets(&mut self) -> Result<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = self
            .committed
            .wallets
            .iter()
            .filter(|(user, _)| !self.staged.wallets.contains_key(user))
            .map(|(_, wallet)| wallet.clone())
            .chain(self.staged.wallets.values().cloned())
            .collect();
        wallets.sort_by_key(|wallet| wallet.user);
        Ok(wallets)
    }

    async fn append_transaction(&mut self, tx: Transaction) -> Result<()> {
        self.staged.transactions.push(tx);
        Ok(())
    }

    async fn transactions(&mut self, user: UserId) -> Result<Vec<Transaction>> {
        Ok(self
            .committed
            .transactions
            .iter()
            .chain(self.staged.transactions.iter())
            .filter(|tx| tx.user == user)
            .cloned()
            .collect())
    }

    async fn all_transactions(&mut self) -> Result<Vec<Transaction>> {
        Ok(self
            .committed
            .transactions
            .iter()
            .chain(self.staged.transactions.iter())
            .cloned()
            .collect())
    }

    async fn user(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self
            .staged
            .users
            .get(&id)
            .or_else(|| self.committed.users.get(&id))
            .cloned())
    }

    async fn put_user(&mut self, user: User) -> Result<()> {
        self.staged.users.insert(user.id, user);
        Ok(())
    }

    async fn course_part(&mut self, id: PartId) -> Result<Option<CoursePart>> {
        Ok(self
            .staged
            .parts
            .get(&id)
            .or_else(|| self.committed.parts.get(&id))
            .cloned())
    }

    async fn put_course_part(&mut self, part: CoursePart) -> Result<()> {
        self.staged.parts.insert(part.id, part);
        Ok(())
    }

    async fn enrollment(&mut self, student: UserId, part: PartId) -> Result<Option<Enrollment>> {
        let key = (student, part);
        Ok(self
            .staged
            .enrollments
            .get(&key)
            .or_else(|| self.committed.enrollments.get(&key))
            .cloned())
    }

    async fn put_enrollment(&mut self, enrollment: Enrollment) -> Result<()> {
        self.staged
            .enrollments
            .insert((enrollment.student, enrollment.part), enrollment);
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<PaymentOrder>> {
        Ok(self
            .staged
            .orders
            .get(&id)
            .or_else(|| self.committed.orders.get(&id))
            .cloned())
    }

    async fn put_order(&mut self, order: PaymentOrder) -> Result<()> {
        self.staged.orders.insert(order.id, order);
        Ok(())
    }

    async fn site_settings(&mut self) -> Result<Option<SitePaymentSettings>> {
        Ok(self
            .staged
            .settings
            .as_ref()
            .or(self.committed.settings.as_ref())
            .cloned())
    }

    async fn put_site_settings(&mut self, settings: SitePaymentSettings) -> Result<()> {
        self.staged.settings = Some(settings);
        Ok(())
    }

    async fn next_id(&mut self, sequence: Sequence) -> Result<u64> {
        let last = self
            .staged
            .sequences
            .get(&sequence)
            .or_else(|| self.committed.sequences.get(&sequence))
            .copied()
            .unwrap_or(0);
        let next = last + 1;
        self.staged.sequences.insert(sequence, next);
        Ok(next)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnit {
            mut committed,
            staged,
        } = *self;
        committed.merge(staged);
        Ok(())
    }
}
