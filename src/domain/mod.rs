//! Domain types of the wallet ledger and the storage ports they are
//! persisted through.

pub mod catalog;
pub mod money;
pub mod payment_order;
pub mod ports;
pub mod settings;
pub mod transaction;
pub mod user;
pub mod wallet;
