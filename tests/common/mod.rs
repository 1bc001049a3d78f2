#![allow(dead_code)]

use nok_wallet::application::engine::WalletEngine;
use nok_wallet::config::Config;
use nok_wallet::domain::catalog::CoursePart;
use nok_wallet::domain::ports::LedgerStoreBox;
use nok_wallet::domain::user::{Role, User, UserId};
use nok_wallet::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal::Decimal;

pub const STUDENT: UserId = 1;
pub const TEACHER: UserId = 2;
pub const PART: u32 = 10;

/// In-memory engine with one student, one enrolled teacher and one part for
/// sale.
pub async fn marketplace(config: &Config, price_z: Decimal) -> WalletEngine {
    marketplace_on(Box::new(InMemoryLedgerStore::new()), config, price_z).await
}

pub async fn marketplace_on(
    store: LedgerStoreBox,
    config: &Config,
    price_z: Decimal,
) -> WalletEngine {
    let engine = WalletEngine::new(store, config).unwrap();
    engine
        .register_user(User::new(STUDENT, "alice", Role::Student))
        .await
        .unwrap();
    engine
        .register_user(User {
            teacher_enrolled: true,
            ..User::new(TEACHER, "bob", Role::Teacher)
        })
        .await
        .unwrap();
    engine
        .publish_part(CoursePart {
            id: PART,
            teacher: TEACHER,
            name: "Physics - Part 1".to_string(),
            price_z,
        })
        .await
        .unwrap();
    engine
}
