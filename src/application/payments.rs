use super::engine::WalletEngine;
use super::ledger::{record, require_user};
use crate::domain::money::Amount;
use crate::domain::payment_order::{OrderId, OrderStatus, PaymentOrder, Provider};
use crate::domain::ports::{Sequence, UnitOfWork};
use crate::domain::transaction::TransactionType;
use crate::domain::user::UserId;
use crate::error::{Result, WalletError};
use chrono::Utc;
use rust_decimal::Decimal;

async fn require_order(unit: &mut dyn UnitOfWork, id: OrderId) -> Result<PaymentOrder> {
    unit.order(id)
        .await?
        .ok_or_else(|| WalletError::NotFound(format!("Payment order {id}")))
}

impl WalletEngine {
    /// Opens a top-up order in state `created`.
    pub async fn create_order(
        &self,
        user: UserId,
        provider: Provider,
        amount_local: Decimal,
        note: Option<String>,
    ) -> Result<PaymentOrder> {
        let amount = Amount::new(amount_local)?;
        let mut unit = self.store.begin().await?;
        require_user(unit.as_mut(), user).await?;

        let order = PaymentOrder {
            id: unit.next_id(Sequence::PaymentOrder).await?,
            user,
            provider,
            amount_local: amount.value(),
            status: OrderStatus::Created,
            external_id: None,
            note,
            created_at: Utc::now(),
            paid_at: None,
        };
        unit.put_order(order.clone()).await?;
        unit.commit().await?;
        tracing::info!(order = order.id, user, provider = %provider, amount_local = %order.amount_local, "payment order created");
        Ok(order)
    }

    /// Confirms an order and credits its amount to the local balance.
    ///
    /// Calling it on an order that is no longer `created` returns the order
    /// unchanged, so a repeated success callback never credits twice.
    pub async fn mark_paid(&self, id: OrderId) -> Result<PaymentOrder> {
        let mut unit = self.store.begin().await?;
        let mut order = require_order(unit.as_mut(), id).await?;
        if !order.transition(OrderStatus::Paid, Utc::now()) {
            tracing::debug!(order = id, status = ?order.status, "order already settled");
            return Ok(order);
        }

        record(
            unit.as_mut(),
            order.user,
            TransactionType::Deposit,
            Some(order.amount_local),
            None,
            format!("Top up via {}", order.provider),
        )
        .await?;
        unit.put_order(order.clone()).await?;
        unit.commit().await?;
        tracing::info!(order = id, user = order.user, amount_local = %order.amount_local, "payment order paid");
        Ok(order)
    }

    pub async fn mark_failed(&self, id: OrderId) -> Result<PaymentOrder> {
        self.close_order(id, OrderStatus::Failed).await
    }

    pub async fn cancel_order(&self, id: OrderId) -> Result<PaymentOrder> {
        self.close_order(id, OrderStatus::Canceled).await
    }

    async fn close_order(&self, id: OrderId, status: OrderStatus) -> Result<PaymentOrder> {
        let mut unit = self.store.begin().await?;
        let mut order = require_order(unit.as_mut(), id).await?;
        if order.transition(status, Utc::now()) {
            unit.put_order(order.clone()).await?;
            unit.commit().await?;
            tracing::info!(order = id, status = ?status, "payment order closed");
        }
        Ok(order)
    }

    /// Attaches the provider's correlation id to an order.
    pub async fn set_external_id(&self, id: OrderId, external_id: String) -> Result<PaymentOrder> {
        let mut unit = self.store.begin().await?;
        let mut order = require_order(unit.as_mut(), id).await?;
        order.external_id = Some(external_id);
        unit.put_order(order.clone()).await?;
        unit.commit().await?;
        Ok(order)
    }

    /// Looks up an order on behalf of its owner. Orders of other users are
    /// reported as missing.
    pub async fn order_for_user(&self, user: UserId, id: OrderId) -> Result<PaymentOrder> {
        let mut unit = self.store.begin().await?;
        let order = require_order(unit.as_mut(), id).await?;
        if order.user != user {
            return Err(WalletError::NotFound(format!("Payment order {id}")));
        }
        Ok(order)
    }

    /// Demo gateway: the order is created and confirmed immediately.
    pub async fn demo_top_up(
        &self,
        user: UserId,
        provider: Provider,
        amount_local: Decimal,
    ) -> Result<PaymentOrder> {
        let order = self
            .create_order(
                user,
                provider,
                amount_local,
                Some("Demo payment gateway (simulation)".to_string()),
            )
            .await?;
        self.mark_paid(order.id).await
    }

    /// Manual card transfer: the order waits in `created` until an admin
    /// confirms it with [`WalletEngine::mark_paid`].
    pub async fn request_card_top_up(
        &self,
        user: UserId,
        amount_local: Decimal,
        tx_ref: Option<&str>,
    ) -> Result<PaymentOrder> {
        let mut note = "Manual card transfer request".to_string();
        if let Some(tx_ref) = tx_ref.map(str::trim).filter(|r| !r.is_empty()) {
            note.push_str(&format!(" | TX: {tx_ref}"));
        }
        self.create_order(user, Provider::Card, amount_local, Some(note))
            .await
    }

    /// Z value of an order's amount at the current rate, for display.
    pub fn estimate_z(&self, order: &PaymentOrder) -> Result<Decimal> {
        self.converter.to_z(order.amount_local)
    }
}
