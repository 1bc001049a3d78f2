mod common;

use async_trait::async_trait;
use common::{PART, STUDENT, TEACHER, marketplace, marketplace_on};
use nok_wallet::config::Config;
use nok_wallet::domain::catalog::{CoursePart, Enrollment, PartId};
use nok_wallet::domain::money::Currency;
use nok_wallet::domain::payment_order::{OrderId, PaymentOrder};
use nok_wallet::domain::ports::{LedgerStore, Sequence, UnitOfWork, UnitOfWorkBox};
use nok_wallet::domain::settings::SitePaymentSettings;
use nok_wallet::domain::transaction::{Transaction, TransactionType};
use nok_wallet::domain::user::{Role, User, UserId};
use nok_wallet::domain::wallet::Wallet;
use nok_wallet::error::{Result, WalletError};
use nok_wallet::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// In-memory store whose units refuse to write enrollments.
struct EnrollmentOutage(InMemoryLedgerStore);

struct EnrollmentOutageUnit(UnitOfWorkBox);

#[async_trait]
impl LedgerStore for EnrollmentOutage {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        Ok(Box::new(EnrollmentOutageUnit(self.0.begin().await?)))
    }
}

#[async_trait]
impl UnitOfWork for EnrollmentOutageUnit {
    async fn wallet(&mut self, user: UserId) -> Result<Option<Wallet>> {
        self.0.wallet(user).await
    }
    async fn put_wallet(&mut self, wallet: Wallet) -> Result<()> {
        self.0.put_wallet(wallet).await
    }
    async fn wallets(&mut self) -> Result<Vec<Wallet>> {
        self.0.wallets().await
    }
    async fn append_transaction(&mut self, tx: Transaction) -> Result<()> {
        self.0.append_transaction(tx).await
    }
    async fn transactions(&mut self, user: UserId) -> Result<Vec<Transaction>> {
        self.0.transactions(user).await
    }
    async fn all_transactions(&mut self) -> Result<Vec<Transaction>> {
        self.0.all_transactions().await
    }
    async fn user(&mut self, id: UserId) -> Result<Option<User>> {
        self.0.user(id).await
    }
    async fn put_user(&mut self, user: User) -> Result<()> {
        self.0.put_user(user).await
    }
    async fn course_part(&mut self, id: PartId) -> Result<Option<CoursePart>> {
        self.0.course_part(id).await
    }
    async fn put_course_part(&mut self, part: CoursePart) -> Result<()> {
        self.0.put_course_part(part).await
    }
    async fn enrollment(&mut self, student: UserId, part: PartId) -> Result<Option<Enrollment>> {
        self.0.enrollment(student, part).await
    }
    async fn put_enrollment(&mut self, _enrollment: Enrollment) -> Result<()> {
        Err(WalletError::InternalError(Box::new(std::io::Error::other(
            "enrollments unavailable",
        ))))
    }
    async fn order(&mut self, id: OrderId) -> Result<Option<PaymentOrder>> {
        self.0.order(id).await
    }
    async fn put_order(&mut self, order: PaymentOrder) -> Result<()> {
        self.0.put_order(order).await
    }
    async fn site_settings(&mut self) -> Result<Option<SitePaymentSettings>> {
        self.0.site_settings().await
    }
    async fn put_site_settings(&mut self, settings: SitePaymentSettings) -> Result<()> {
        self.0.put_site_settings(settings).await
    }
    async fn next_id(&mut self, sequence: Sequence) -> Result<u64> {
        self.0.next_id(sequence).await
    }
    async fn commit(self: Box<Self>) -> Result<()> {
        self.0.commit().await
    }
}

#[tokio::test]
async fn test_purchase_scenario_with_auto_conversion() {
    let engine = marketplace(&Config::default(), dec!(20)).await;
    engine.deposit_local(STUDENT, dec!(100000)).await.unwrap();

    let purchase = engine.purchase_course_part(STUDENT, PART).await.unwrap();
    let receipt = purchase.receipt.unwrap();
    assert_eq!(receipt.auto_converted_z, Some(dec!(20)));
    assert_eq!(receipt.commission_z, dec!(2));
    assert_eq!(receipt.teacher_payout_z, dec!(18));

    let student = engine.get_or_create_wallet(STUDENT).await.unwrap();
    assert_eq!(student.balance_local.value(), dec!(80000));
    assert_eq!(student.balance_z.value(), dec!(0));
    let teacher = engine.get_or_create_wallet(TEACHER).await.unwrap();
    assert_eq!(teacher.balance_z.value(), dec!(18));

    let history = engine.transactions(STUDENT, None).await.unwrap();
    let types: Vec<_> = history.iter().map(|tx| tx.r#type).collect();
    assert_eq!(
        types,
        vec![
            TransactionType::CoursePurchase,
            TransactionType::ConvertToZ,
            TransactionType::Deposit
        ]
    );
    assert!(engine.reconcile(STUDENT).await.unwrap().is_balanced());
    assert!(engine.reconcile(TEACHER).await.unwrap().is_balanced());
}

#[tokio::test]
async fn test_concurrent_double_purchase_charges_once() {
    let engine = Arc::new(marketplace(&Config::default(), dec!(20)).await);
    engine.deposit_local(STUDENT, dec!(100000)).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.purchase_course_part(STUDENT, PART).await })
        })
        .collect();

    let mut charged = 0;
    for handle in handles {
        let purchase = handle.await.unwrap().unwrap();
        if purchase.receipt.is_some() {
            charged += 1;
        }
    }
    assert_eq!(charged, 1);

    let student = engine.get_or_create_wallet(STUDENT).await.unwrap();
    assert_eq!(student.balance_local.value(), dec!(80000));
    let purchases = engine
        .transactions(STUDENT, None)
        .await
        .unwrap()
        .into_iter()
        .filter(|tx| tx.r#type == TransactionType::CoursePurchase)
        .count();
    assert_eq!(purchases, 1);
    assert_eq!(engine.user(STUDENT).await.unwrap().xp, 50);
}

#[tokio::test]
async fn test_failed_purchase_leaves_no_trace() {
    let engine = marketplace(&Config::default(), dec!(20)).await;
    engine.deposit_local(STUDENT, dec!(19999)).await.unwrap();

    let result = engine.purchase_course_part(STUDENT, PART).await;
    assert!(matches!(
        result,
        Err(WalletError::InsufficientFunds {
            currency: Currency::Local,
            ..
        })
    ));

    let student = engine.get_or_create_wallet(STUDENT).await.unwrap();
    assert_eq!(student.balance_local.value(), dec!(19999));
    assert_eq!(engine.transactions(STUDENT, None).await.unwrap().len(), 1);
    assert!(engine.enrollment(STUDENT, PART).await.unwrap().is_none());
}

#[tokio::test]
async fn test_storage_failure_rolls_back_auto_conversion() {
    let store = Box::new(EnrollmentOutage(InMemoryLedgerStore::new()));
    let engine = marketplace_on(store, &Config::default(), dec!(20)).await;
    engine.deposit_local(STUDENT, dec!(100000)).await.unwrap();

    let result = engine.purchase_course_part(STUDENT, PART).await;
    assert!(matches!(result, Err(WalletError::InternalError(_))));

    let student = engine.get_or_create_wallet(STUDENT).await.unwrap();
    assert_eq!(student.balance_local.value(), dec!(100000));
    assert_eq!(student.balance_z.value(), dec!(0));
    let history = engine.transactions(STUDENT, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].r#type, TransactionType::Deposit);

    let teacher = engine.get_or_create_wallet(TEACHER).await.unwrap();
    assert_eq!(teacher.balance_z.value(), dec!(0));
    assert!(engine.transactions(TEACHER, None).await.unwrap().is_empty());
    assert_eq!(engine.user(STUDENT).await.unwrap().xp, 0);
}

#[tokio::test]
async fn test_withdraw_scenario() {
    let engine = marketplace(&Config::default(), dec!(100)).await;
    engine.deposit_local(STUDENT, dec!(100000)).await.unwrap();
    engine.purchase_course_part(STUDENT, PART).await.unwrap();

    let withdrawal = engine.withdraw_z_to_local(TEACHER, dec!(50)).await.unwrap();
    assert_eq!(withdrawal.fee_z, dec!(2.5));
    assert_eq!(withdrawal.net_local, dec!(47500));

    let teacher = engine.get_or_create_wallet(TEACHER).await.unwrap();
    assert_eq!(teacher.balance_z.value(), dec!(40));
    assert_eq!(teacher.balance_local.value(), dec!(47500));
}

#[tokio::test]
async fn test_enrollment_fee_scenario() {
    const NEWCOMER: UserId = 3;
    let engine = marketplace(&Config::default(), dec!(5)).await;
    engine
        .register_user(User::new(NEWCOMER, "carol", Role::Teacher))
        .await
        .unwrap();
    engine.deposit_local(NEWCOMER, dec!(5000)).await.unwrap();
    engine.convert_local_to_z(NEWCOMER, dec!(5000)).await.unwrap();
    let before = engine.get_or_create_wallet(NEWCOMER).await.unwrap();
    assert_eq!(before.balance_z.value(), dec!(5));

    let result = engine.enroll_teacher(NEWCOMER).await;
    assert!(matches!(
        result,
        Err(WalletError::InsufficientFunds {
            currency: Currency::Z,
            ..
        })
    ));
    assert_eq!(engine.get_or_create_wallet(NEWCOMER).await.unwrap(), before);
    assert!(!engine.user(NEWCOMER).await.unwrap().teacher_enrolled);

    let draft = CoursePart {
        id: 20,
        teacher: NEWCOMER,
        name: "Draft".to_string(),
        price_z: dec!(3),
    };
    assert!(matches!(
        engine.publish_part(draft).await,
        Err(WalletError::RoleForbidden { .. })
    ));
}
