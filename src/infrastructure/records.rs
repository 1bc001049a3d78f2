use crate::domain::catalog::{CoursePart, Enrollment, PartId};
use crate::domain::payment_order::{OrderId, PaymentOrder};
use crate::domain::ports::Sequence;
use crate::domain::settings::SitePaymentSettings;
use crate::domain::transaction::Transaction;
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use std::collections::HashMap;

/// A set of records: either a store's committed state or the changes a unit
/// of work has staged on top of it.
#[derive(Debug, Default, Clone)]
pub(crate) struct Records {
    pub wallets: HashMap<UserId, Wallet>,
    pub users: HashMap<UserId, User>,
    pub parts: HashMap<PartId, CoursePart>,
    pub enrollments: HashMap<(UserId, PartId), Enrollment>,
    pub orders: HashMap<OrderId, PaymentOrder>,
    /// Append-only, ascending id.
    pub transactions: Vec<Transaction>,
    pub settings: Option<SitePaymentSettings>,
    /// Last id issued per sequence.
    pub sequences: HashMap<Sequence, u64>,
}

impl Records {
    /// Applies staged changes on top of `self`.
    pub fn merge(&mut self, staged: Records) {
        self.wallets.extend(staged.wallets);
        self.users.extend(staged.users);
        self.parts.extend(staged.parts);
        self.enrollments.extend(staged.enrollments);
        self.orders.extend(staged.orders);
        self.transactions.extend(staged.transactions);
        if let Some(settings) = staged.settings {
            self.settings = Some(settings);
        }
        self.sequences.extend(staged.sequences);
    }
}
