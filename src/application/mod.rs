//! Application layer containing the ledger and commerce orchestration.
//!
//! `WalletEngine` is the entry point. Its operations are split by concern:
//! ledger bookkeeping, currency conversion, settlement and payment orders.
//! Every operation runs inside one storage unit of work.

pub mod conversion;
pub mod engine;
pub mod ledger;
pub mod payments;
pub mod settlement;
