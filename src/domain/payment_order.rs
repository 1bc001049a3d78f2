use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type OrderId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Card,
    Payme,
    Click,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Card => "Card",
            Provider::Payme => "Payme",
            Provider::Click => "Click",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(Provider::Card),
            "payme" => Ok(Provider::Payme),
            "click" => Ok(Provider::Click),
            other => Err(format!("unknown payment provider '{other}'")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Failed,
    Canceled,
}

impl OrderStatus {
    /// Every state other than `Created` is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Created)
    }
}

/// An external top-up attempt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentOrder {
    pub id: OrderId,
    pub user: UserId,
    pub provider: Provider,
    pub amount_local: Decimal,
    pub status: OrderStatus,
    /// Correlation id handed back by the provider, if any.
    pub external_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentOrder {
    /// Moves the order out of `Created`.
    ///
    /// Returns `false` and leaves the order untouched when it is already
    /// terminal, so repeated provider callbacks are harmless.
    pub fn transition(&mut self, status: OrderStatus, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        if status == OrderStatus::Paid {
            self.paid_at = Some(at);
        }
        true
    }
}
