use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PartId = u32;

/// A purchasable section of a course, priced in Z.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePart {
    pub id: PartId,
    /// Teacher who owns the course and receives the payout.
    pub teacher: UserId,
    pub name: String,
    pub price_z: Decimal,
}

impl fmt::Display for CoursePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Access of a student to a course part. At most one per (student, part).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student: UserId,
    pub part: PartId,
    pub is_trial: bool,
    pub progress_percent: u8,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn paid(student: UserId, part: PartId) -> Self {
        Self {
            student,
            part,
            is_trial: false,
            progress_percent: 0,
            created_at: Utc::now(),
        }
    }
}
