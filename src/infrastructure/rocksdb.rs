use super::records::Records;
use crate::domain::catalog::{CoursePart, Enrollment, PartId};
use crate::domain::payment_order::{OrderId, PaymentOrder};
use crate::domain::ports::{LedgerStore, Sequence, UnitOfWork, UnitOfWorkBox};
use crate::domain::settings::SitePaymentSettings;
use crate::domain::transaction::Transaction;
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Column Family for wallet balances, keyed by user.
pub const CF_WALLETS: &str = "wallets";
/// Column Family for the transaction log, keyed by user then transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for payment orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for directory accounts.
pub const CF_USERS: &str = "users";
/// Column Family for course parts.
pub const CF_PARTS: &str = "parts";
/// Column Family for enrollments, keyed by student then part.
pub const CF_ENROLLMENTS: &str = "enrollments";
/// Column Family for singletons: site settings and id sequences.
pub const CF_META: &str = "meta";

const COLUMN_FAMILIES: [&str; 7] = [
    CF_WALLETS,
    CF_TRANSACTIONS,
    CF_ORDERS,
    CF_USERS,
    CF_PARTS,
    CF_ENROLLMENTS,
    CF_META,
];

const KEY_SITE_SETTINGS: &[u8] = b"site_settings";

/// A persistent store implementation using RocksDB.
///
/// Each entity lives in its own Column Family as JSON. A unit of work stages
/// its writes in memory and commits them with a single `WriteBatch`, so a
/// settlement is either fully on disk or not at all.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            lock: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        Ok(Box::new(RocksDBUnit {
            _guard: guard,
            db: Arc::clone(&self.db),
            staged: Records::default(),
        }))
    }
}

fn handle<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name).ok_or_else(|| {
        WalletError::InternalError(Box::new(std::io::Error::other(format!(
            "{name} column family not found"
        ))))
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        WalletError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        WalletError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

fn get<T: DeserializeOwned>(db: &DB, cf: &str, key: &[u8]) -> Result<Option<T>> {
    let handle = handle(db, cf)?;
    match db.get_cf(handle, key)? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

/// Decodes every value whose key starts with `prefix`, in key order.
fn scan<T: DeserializeOwned>(db: &DB, cf: &str, prefix: &[u8]) -> Result<Vec<T>> {
    let handle = handle(db, cf)?;
    let mut values = Vec::new();
    for item in db.iterator_cf(handle, IteratorMode::From(prefix, Direction::Forward)) {
        let (key, value) = item?;
        if !key.starts_with(prefix) {
            break;
        }
        values.push(decode(&value)?);
    }
    Ok(values)
}

fn transaction_key(user: UserId, id: u64) -> Vec<u8> {
    let mut key = user.to_be_bytes().to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn enrollment_key(student: UserId, part: PartId) -> Vec<u8> {
    let mut key = student.to_be_bytes().to_vec();
    key.extend_from_slice(&part.to_be_bytes());
    key
}

fn sequence_key(sequence: Sequence) -> &'static [u8] {
    match sequence {
        Sequence::Transaction => b"seq:transaction",
        Sequence::PaymentOrder => b"seq:payment_order",
    }
}

struct RocksDBUnit {
    _guard: OwnedMutexGuard<()>,
    db: Arc<DB>,
    staged: Records,
}

#[async_trait]
impl UnitOfWork for RocksDBUnit {
    async fn wallet(&mut self, user: UserId) -> Result<Option<Wallet>> {
        if let Some(wallet) = self.staged.wallets.get(&user) {
            return Ok(Some(wallet.clone()));
        }
        get(&self.db, CF_WALLETS, &user.to_be_bytes())
    }

    async fn put_wallet(&mut self, wallet: Wallet) -> Result<()> {
        self.staged.wallets.insert(wallet.user, wallet);
        Ok(())
    }

    async fn wallets(&mut self) -> Result<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = scan::<Wallet>(&self.db, CF_WALLETS, &[])?
            .into_iter()
            .filter(|wallet| !self.staged.wallets.contains_key(&wallet.user))
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
        let mut txs: Vec<Transaction> = scan(&self.db, CF_TRANSACTIONS, &user.to_be_bytes())?;
        txs.extend(
            self.staged
                .transactions
                .iter()
                .filter(|tx| tx.user == user)
                .cloned(),
        );
        Ok(txs)
    }

    async fn all_transactions(&mut self) -> Result<Vec<Transaction>> {
        let mut txs: Vec<Transaction> = scan(&self.db, CF_TRANSACTIONS, &[])?;
        txs.extend(self.staged.transactions.iter().cloned());
        txs.sort_by_key(|tx| tx.id);
        Ok(txs)
    }

    async fn user(&mut self, id: UserId) -> Result<Option<User>> {
        if let Some(user) = self.staged.users.get(&id) {
            return Ok(Some(user.clone()));
        }
        get(&self.db, CF_USERS, &id.to_be_bytes())
    }

    async fn put_user(&mut self, user: User) -> Result<()> {
        self.staged.users.insert(user.id, user);
        Ok(())
    }

    async fn course_part(&mut self, id: PartId) -> Result<Option<CoursePart>> {
        if let Some(part) = self.staged.parts.get(&id) {
            return Ok(Some(part.clone()));
        }
        get(&self.db, CF_PARTS, &id.to_be_bytes())
    }

    async fn put_course_part(&mut self, part: CoursePart) -> Result<()> {
        self.staged.parts.insert(part.id, part);
        Ok(())
    }

    async fn enrollment(&mut self, student: UserId, part: PartId) -> Result<Option<Enrollment>> {
        if let Some(enrollment) = self.staged.enrollments.get(&(student, part)) {
            return Ok(Some(enrollment.clone()));
        }
        get(&self.db, CF_ENROLLMENTS, &enrollment_key(student, part))
    }

    async fn put_enrollment(&mut self, enrollment: Enrollment) -> Result<()> {
        self.staged
            .enrollments
            .insert((enrollment.student, enrollment.part), enrollment);
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<PaymentOrder>> {
        if let Some(order) = self.staged.orders.get(&id) {
            return Ok(Some(order.clone()));
        }
        get(&self.db, CF_ORDERS, &id.to_be_bytes())
    }

    async fn put_order(&mut self, order: PaymentOrder) -> Result<()> {
        self.staged.orders.insert(order.id, order);
        Ok(())
    }

    async fn site_settings(&mut self) -> Result<Option<SitePaymentSettings>> {
        if let Some(settings) = &self.staged.settings {
            return Ok(Some(settings.clone()));
        }
        get(&self.db, CF_META, KEY_SITE_SETTINGS)
    }

    async fn put_site_settings(&mut self, settings: SitePaymentSettings) -> Result<()> {
        self.staged.settings = Some(settings);
        Ok(())
    }

    async fn next_id(&mut self, sequence: Sequence) -> Result<u64> {
        let last = match self.staged.sequences.get(&sequence) {
            Some(last) => *last,
            None => get::<u64>(&self.db, CF_META, sequence_key(sequence))?.unwrap_or(0),
        };
        let next = last + 1;
        self.staged.sequences.insert(sequence, next);
        Ok(next)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let db = &self.db;
        let staged = &self.staged;
        let mut batch = WriteBatch::default();

        let wallets = handle(db, CF_WALLETS)?;
        for (user, wallet) in &staged.wallets {
            batch.put_cf(wallets, user.to_be_bytes(), encode(wallet)?);
        }
        let transactions = handle(db, CF_TRANSACTIONS)?;
        for tx in &staged.transactions {
            batch.put_cf(transactions, transaction_key(tx.user, tx.id), encode(tx)?);
        }
        let users = handle(db, CF_USERS)?;
        for (id, user) in &staged.users {
            batch.put_cf(users, id.to_be_bytes(), encode(user)?);
        }
        let parts = handle(db, CF_PARTS)?;
        for (id, part) in &staged.parts {
            batch.put_cf(parts, id.to_be_bytes(), encode(part)?);
        }
        let enrollments = handle(db, CF_ENROLLMENTS)?;
        for ((student, part), enrollment) in &staged.enrollments {
            batch.put_cf(enrollments, enrollment_key(*student, *part), encode(enrollment)?);
        }
        let orders = handle(db, CF_ORDERS)?;
        for (id, order) in &staged.orders {
            batch.put_cf(orders, id.to_be_bytes(), encode(order)?);
        }
        let meta = handle(db, CF_META)?;
        if let Some(settings) = &staged.settings {
            batch.put_cf(meta, KEY_SITE_SETTINGS, encode(settings)?);
        }
        for (sequence, last) in &staged.sequences {
            batch.put_cf(meta, sequence_key(*sequence), encode(last)?);
        }

        db.write(batch)?;
        Ok(())
    }
}
