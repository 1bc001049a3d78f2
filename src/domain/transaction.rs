use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TransactionId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    ConvertToZ,
    CoursePurchase,
    Withdrawal,
    TeacherEnrollmentFee,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::Deposit => "deposit",
            TransactionType::ConvertToZ => "convert_to_z",
            TransactionType::CoursePurchase => "course_purchase",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::TeacherEnrollmentFee => "teacher_enrollment_fee",
        };
        f.write_str(name)
    }
}

/// An immutable ledger entry. Deltas are signed; `None` means the currency
/// was not touched.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub user: UserId,
    pub r#type: TransactionType,
    pub amount_local: Option<Decimal>,
    pub amount_z: Option<Decimal>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
