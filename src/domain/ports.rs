use super::catalog::{CoursePart, Enrollment, PartId};
use super::payment_order::{OrderId, PaymentOrder};
use super::settings::SitePaymentSettings;
use super::transaction::Transaction;
use super::user::{User, UserId};
use super::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Monotonic id sequences kept by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sequence {
    Transaction,
    PaymentOrder,
}

/// Entry point to persistent state.
///
/// Every read and write goes through a [`UnitOfWork`]. A unit has exclusive
/// access to the store until it is committed or dropped, so checks made
/// inside it cannot be invalidated by a concurrent caller.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<UnitOfWorkBox>;
}

/// One atomic scope over wallets, transactions, orders, settings and the
/// directory/catalog records settlement touches.
///
/// Writes are staged and become durable together on [`UnitOfWork::commit`].
/// Dropping a unit without committing discards them.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn wallet(&mut self, user: UserId) -> Result<Option<Wallet>>;
    async fn put_wallet(&mut self, wallet: Wallet) -> Result<()>;
    async fn wallets(&mut self) -> Result<Vec<Wallet>>;

    async fn append_transaction(&mut self, tx: Transaction) -> Result<()>;
    /// Transactions of one user in ascending id order.
    async fn transactions(&mut self, user: UserId) -> Result<Vec<Transaction>>;
    /// Every transaction in ascending id order.
    async fn all_transactions(&mut self) -> Result<Vec<Transaction>>;

    async fn user(&mut self, id: UserId) -> Result<Option<User>>;
    async fn put_user(&mut self, user: User) -> Result<()>;

    async fn course_part(&mut self, id: PartId) -> Result<Option<CoursePart>>;
    async fn put_course_part(&mut self, part: CoursePart) -> Result<()>;

    async fn enrollment(&mut self, student: UserId, part: PartId) -> Result<Option<Enrollment>>;
    async fn put_enrollment(&mut self, enrollment: Enrollment) -> Result<()>;

    async fn order(&mut self, id: OrderId) -> Result<Option<PaymentOrder>>;
    async fn put_order(&mut self, order: PaymentOrder) -> Result<()>;

    async fn site_settings(&mut self) -> Result<Option<SitePaymentSettings>>;
    async fn put_site_settings(&mut self, settings: SitePaymentSettings) -> Result<()>;

    /// Issues the next id of a sequence. Ids start at 1.
    async fn next_id(&mut self, sequence: Sequence) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type UnitOfWorkBox = Box<dyn UnitOfWork>;
