use super::conversion::convert_in_unit;
use super::engine::WalletEngine;
use super::ledger::{record, require_user, wallet_or_new};
use crate::domain::catalog::{Enrollment, PartId};
use crate::domain::money::{Amount, Currency, checked, round2};
use crate::domain::transaction::{Transaction, TransactionType};
use crate::domain::user::{Role, UserId};
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;

/// Money moved by a charged purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub price_z: Decimal,
    /// Platform share, kept out of both wallets.
    pub commission_z: Decimal,
    pub teacher_payout_z: Decimal,
    /// Z bought from the local balance to cover a shortfall, if any.
    pub auto_converted_z: Option<Decimal>,
}

/// Outcome of [`WalletEngine::purchase_course_part`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub enrollment: Enrollment,
    /// `None` when the student was already enrolled and nothing was charged.
    pub receipt: Option<PurchaseReceipt>,
}

/// Outcome of [`WalletEngine::withdraw_z_to_local`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub net_local: Decimal,
    pub fee_z: Decimal,
    pub transaction: Transaction,
}

impl WalletEngine {
    /// Buys a course part for a student.
    ///
    /// Runs as a single unit: the optional auto-conversion, the student debit,
    /// the teacher payout, the enrollment and the XP reward commit together.
    /// A student who is already enrolled gets the existing enrollment back and
    /// is not charged again.
    pub async fn purchase_course_part(&self, student: UserId, part: PartId) -> Result<Purchase> {
        let mut unit = self.store.begin().await?;
        let mut buyer = require_user(unit.as_mut(), student).await?;
        match buyer.role {
            Role::Student => {}
            role @ (Role::Teacher | Role::Ceo) => {
                return Err(WalletError::RoleForbidden {
                    role,
                    action: "purchase course parts",
                });
            }
        }

        let part = unit
            .course_part(part)
            .await?
            .ok_or_else(|| WalletError::NotFound(format!("Course part {part}")))?;

        if let Some(enrollment) = unit.enrollment(student, part.id).await? {
            tracing::debug!(student, part = part.id, "already enrolled, purchase skipped");
            return Ok(Purchase {
                enrollment,
                receipt: None,
            });
        }

        let price_z = Amount::new(part.price_z)?.value();
        let teacher = require_user(unit.as_mut(), part.teacher).await?;
        let wallet = wallet_or_new(unit.as_mut(), student).await?;

        let mut auto_converted_z = None;
        if !wallet.balance_z.covers(price_z) {
            let shortfall_z = price_z - wallet.balance_z;
            let shortfall_local = self.converter.to_local_covering(shortfall_z)?;
            if !wallet.balance_local.covers(shortfall_local) {
                return Err(WalletError::InsufficientFunds {
                    currency: Currency::Local,
                    available: wallet.balance_local.value(),
                    required: shortfall_local,
                });
            }
            let converted = convert_in_unit(
                unit.as_mut(),
                &self.converter,
                student,
                shortfall_local,
                format!("Auto-convert to complete purchase for {part}"),
            )
            .await?;
            auto_converted_z = Some(converted);
        }

        let commission_z = round2(checked(
            price_z.checked_mul(self.config.commission_rate),
            "commission",
        )?);
        let teacher_payout_z = price_z - commission_z;

        // Re-checked by the ledger: fails the whole unit if the conversion
        // still left the student short.
        record(
            unit.as_mut(),
            student,
            TransactionType::CoursePurchase,
            None,
            Some(-price_z),
            format!("Purchase {part}"),
        )
        .await?;
        record(
            unit.as_mut(),
            teacher.id,
            TransactionType::CoursePurchase,
            None,
            Some(teacher_payout_z),
            format!("Earned from {} for {part}", buyer.username),
        )
        .await?;

        let enrollment = Enrollment::paid(student, part.id);
        unit.put_enrollment(enrollment.clone()).await?;

        buyer.xp = buyer.xp.saturating_add(self.config.purchase_xp_reward);
        unit.put_user(buyer).await?;

        unit.commit().await?;
        tracing::info!(
            student,
            teacher = teacher.id,
            part = part.id,
            price_z = %price_z,
            commission_z = %commission_z,
            "course part purchased"
        );

        Ok(Purchase {
            enrollment,
            receipt: Some(PurchaseReceipt {
                price_z,
                commission_z,
                teacher_payout_z,
                auto_converted_z,
            }),
        })
    }

    /// Charges a teacher the one-time enrollment fee from the current site
    /// settings and marks them enrolled.
    pub async fn enroll_teacher(&self, teacher: UserId) -> Result<Transaction> {
        let mut unit = self.store.begin().await?;
        let mut user = require_user(unit.as_mut(), teacher).await?;
        match user.role {
            Role::Teacher => {}
            role @ (Role::Student | Role::Ceo) => {
                return Err(WalletError::RoleForbidden {
                    role,
                    action: "pay the teacher enrollment fee",
                });
            }
        }
        if user.teacher_enrolled {
            return Err(WalletError::AlreadyEnrolled(teacher));
        }

        let fee_z = Decimal::from(
            unit.site_settings()
                .await?
                .unwrap_or_else(|| self.site_defaults.clone())
                .teacher_enrollment_fee_z,
        );
        let wallet = wallet_or_new(unit.as_mut(), teacher).await?;
        if !wallet.balance_z.covers(fee_z) {
            return Err(WalletError::InsufficientFunds {
                currency: Currency::Z,
                available: wallet.balance_z.value(),
                required: fee_z,
            });
        }

        let tx = record(
            unit.as_mut(),
            teacher,
            TransactionType::TeacherEnrollmentFee,
            None,
            Some(-fee_z),
            "Teacher enrollment fee".to_string(),
        )
        .await?;
        user.teacher_enrolled = true;
        unit.put_user(user).await?;

        unit.commit().await?;
        tracing::info!(teacher, fee_z = %fee_z, "teacher enrolled");
        Ok(tx)
    }

    /// Cashes Z out to the local balance minus the withdrawal fee.
    ///
    /// The full `amount_z` is debited; the fee is the part of it that is not
    /// converted.
    pub async fn withdraw_z_to_local(&self, user: UserId, amount_z: Decimal) -> Result<Withdrawal> {
        let amount_z = Amount::new(amount_z)?.value();
        let mut unit = self.store.begin().await?;
        require_user(unit.as_mut(), user).await?;

        let wallet = wallet_or_new(unit.as_mut(), user).await?;
        if !wallet.balance_z.covers(amount_z) {
            return Err(WalletError::InvalidAmount(format!(
                "cannot withdraw {amount_z} Z, balance is {}",
                wallet.balance_z
            )));
        }

        let fee_z = round2(checked(
            amount_z.checked_mul(self.config.withdrawal_fee_rate),
            "withdrawal fee",
        )?);
        let net_local = self.converter.to_local(amount_z - fee_z)?;

        let transaction = record(
            unit.as_mut(),
            user,
            TransactionType::Withdrawal,
            Some(net_local),
            Some(-amount_z),
            format!("Withdrew {amount_z} Z (fee {fee_z} Z)"),
        )
        .await?;

        unit.commit().await?;
        tracing::info!(user, amount_z = %amount_z, fee_z = %fee_z, net_local = %net_local, "Z withdrawn");
        Ok(Withdrawal {
            net_local,
            fee_z,
            transaction,
        })
    }
}
