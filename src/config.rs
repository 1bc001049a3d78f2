//! Runtime configuration.
//!
//! Loaded from an optional TOML file; every key has a default so an empty or
//! missing file yields a working setup.
//!
//! ```toml
//! [ledger]
//! exchange_rate = "1000"
//! commission_rate = "0.10"
//! withdrawal_fee_rate = "0.05"
//! purchase_xp_reward = 50
//!
//! [site]
//! teacher_enrollment_fee_z = 10
//! telegram_support = "@nok_support"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use crate::domain::settings::SitePaymentSettings;
use crate::error::{Result, WalletError};
use crate::logging::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub ledger: LedgerConfig,
    /// Seed for the site payment settings record until an admin saves one.
    pub site: SitePaymentSettings,
    pub logging: LoggingConfig,
}

/// Process-wide constants of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Local-currency units per 1 Z.
    pub exchange_rate: Decimal,
    /// Platform share of every course purchase.
    pub commission_rate: Decimal,
    /// Share of a withdrawal kept as a fee.
    pub withdrawal_fee_rate: Decimal,
    /// XP granted to a student for each purchased course part.
    pub purchase_xp_reward: u64,
    /// Default number of entries returned by wallet history.
    pub history_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            exchange_rate: dec!(1000),
            commission_rate: dec!(0.10),
            withdrawal_fee_rate: dec!(0.05),
            purchase_xp_reward: 50,
            history_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| WalletError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let ledger = &self.ledger;
        if ledger.exchange_rate <= Decimal::ZERO {
            return Err(WalletError::ConfigError(format!(
                "exchange_rate must be positive, got {}",
                ledger.exchange_rate
            )));
        }
        for (name, rate) in [
            ("commission_rate", ledger.commission_rate),
            ("withdrawal_fee_rate", ledger.withdrawal_fee_rate),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(WalletError::ConfigError(format!(
                    "{name} must be in [0, 1), got {rate}"
                )));
            }
        }
        Ok(())
    }
}
