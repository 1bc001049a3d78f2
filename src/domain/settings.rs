use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin-editable payment settings, stored as a single record and read at
/// call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitePaymentSettings {
    /// One-time fee a teacher pays before publishing courses.
    pub teacher_enrollment_fee_z: u32,
    pub card_holder_name: String,
    pub card_last4: String,
    pub telegram_support: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SitePaymentSettings {
    fn default() -> Self {
        Self {
            teacher_enrollment_fee_z: 10,
            card_holder_name: String::new(),
            card_last4: String::new(),
            telegram_support: String::new(),
            updated_at: None,
        }
    }
}
