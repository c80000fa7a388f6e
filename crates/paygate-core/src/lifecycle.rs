//! Order lifecycle manager — the sole writer of order status.
//!
//! Every status change funnels through [`OrderLifecycle::transition`],
//! which re-checks the expected current status at write time. A write
//! that raced another writer loses with an `InvalidState`-kind error
//! instead of silently double-processing.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use paygate_store::RecordStore;
use paygate_types::{
    ActorContext, ActorId, ActorRole, Order, OrderId, OrderStatus, PaygateError, ReceiptId, Result,
};

use crate::tenancy;

/// Owns every mutation of the order record family.
pub struct OrderLifecycle<S> {
    store: Arc<S>,
}

impl<S> Clone for OrderLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore> OrderLifecycle<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a new order in `PENDING` status. Vendor action.
    ///
    /// # Errors
    /// - `RoleNotPermitted` if the context is not a vendor
    /// - `InvalidAmount` for a zero or negative amount
    pub async fn create(
        &self,
        vendor: &ActorContext,
        buyer_id: ActorId,
        amount: Decimal,
        buyer_contact: impl Into<String>,
        note: Option<String>,
    ) -> Result<Order> {
        tenancy::require_role(vendor, ActorRole::Vendor)?;
        if amount <= Decimal::ZERO {
            return Err(PaygateError::InvalidAmount(amount));
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            tenant_id: vendor.tenant,
            vendor_id: vendor.actor,
            buyer_id,
            amount,
            buyer_contact: buyer_contact.into(),
            status: OrderStatus::Pending,
            notes: note.into_iter().collect(),
            receipt_id: None,
            created_at: now,
            updated_at: now,
        };
        self.store.put_order(&order).await?;

        tracing::info!(order = %order.id, tenant = %order.tenant_id, amount = %order.amount, "Order created");
        Ok(order)
    }

    /// Buyer confirmed the purchase: `PENDING -> CONFIRMED`.
    pub async fn confirm(&self, ctx: &ActorContext, order_id: OrderId) -> Result<Order> {
        self.transition(ctx, order_id, OrderStatus::Pending, OrderStatus::Confirmed, None)
            .await
    }

    /// Buyer claims payment was sent: `CONFIRMED -> PAID`.
    pub async fn mark_paid(&self, ctx: &ActorContext, order_id: OrderId) -> Result<Order> {
        self.transition(ctx, order_id, OrderStatus::Confirmed, OrderStatus::Paid, None)
            .await
    }

    /// Attach an uploaded receipt to a `PAID` order (1:1).
    ///
    /// # Errors
    /// - `DuplicateReceipt` if the order already carries a receipt
    /// - `OrderMoved` if the order is not currently `PAID`
    pub async fn attach_receipt(
        &self,
        ctx: &ActorContext,
        order_id: OrderId,
        receipt_id: ReceiptId,
    ) -> Result<Order> {
        let mut order = self.load(ctx, order_id).await?;
        if order.receipt_id.is_some() {
            return Err(PaygateError::DuplicateReceipt(order_id));
        }
        let current = order.status;
        order.receipt_id = Some(receipt_id);
        order.updated_at = Utc::now();
        self.store.update_order(&order, current).await?;
        Ok(order)
    }

    /// Move an order along one edge of the status state machine.
    ///
    /// `expected_current` is re-checked at write time by the store's
    /// conditional update: if the order moved underneath the caller, the
    /// write is rejected. First writer wins.
    ///
    /// # Errors
    /// - `OrderNotFound`, `CrossTenant`
    /// - `OrderMoved` when the status at write time differs from `expected_current`
    /// - `InvalidTransition` when `(expected_current -> new_status)` is not
    ///   an edge of the state machine
    pub async fn transition(
        &self,
        ctx: &ActorContext,
        order_id: OrderId,
        expected_current: OrderStatus,
        new_status: OrderStatus,
        note: Option<String>,
    ) -> Result<Order> {
        let mut order = self.load(ctx, order_id).await?;

        if order.status != expected_current {
            return Err(PaygateError::OrderMoved {
                order: order_id,
                expected: expected_current,
                actual: order.status,
            });
        }
        if !expected_current.can_transition_to(new_status) {
            return Err(PaygateError::InvalidTransition {
                order: order_id,
                from: expected_current,
                to: new_status,
            });
        }

        order.status = new_status;
        order.updated_at = Utc::now();
        if let Some(note) = note {
            order.notes.push(note);
        }
        self.store.update_order(&order, expected_current).await?;

        tracing::info!(
            order = %order_id,
            from = %expected_current,
            to = %new_status,
            actor = %ctx.actor,
            "Order transition"
        );
        Ok(order)
    }

    /// Tenancy-guarded read.
    pub async fn load(&self, ctx: &ActorContext, order_id: OrderId) -> Result<Order> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(PaygateError::OrderNotFound(order_id))?;
        tenancy::authorize(ctx.tenant, order.tenant_id)?;
        Ok(order)
    }

    /// The tenant-agnostic store handle, for components layered on top.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_store::MemoryStore;
    use paygate_types::TenantId;

    fn vendor_ctx(tenant: TenantId) -> ActorContext {
        ActorContext::new(ActorId::new(), tenant, ActorRole::Vendor)
    }

    async fn setup() -> (OrderLifecycle<MemoryStore>, ActorContext, Order) {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = OrderLifecycle::new(store);
        let tenant = TenantId::new();
        let vendor = vendor_ctx(tenant);
        let order = lifecycle
            .create(
                &vendor,
                ActorId::new(),
                Decimal::new(5000, 0),
                "+15550001234",
                Some("phone order".to_string()),
            )
            .await
            .unwrap();
        (lifecycle, vendor, order)
    }

    #[tokio::test]
    async fn create_starts_pending() {
        let (_, _, order) = setup().await;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.notes, vec!["phone order".to_string()]);
    }

    #[tokio::test]
    async fn create_rejects_bad_amount() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = OrderLifecycle::new(store);
        let vendor = vendor_ctx(TenantId::new());

        let err = lifecycle
            .create(&vendor, ActorId::new(), Decimal::ZERO, "x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::InvalidAmount(_)));

        let err = lifecycle
            .create(&vendor, ActorId::new(), Decimal::new(-5, 0), "x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn create_requires_vendor_role() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = OrderLifecycle::new(store);
        let buyer = ActorContext::new(ActorId::new(), TenantId::new(), ActorRole::Buyer);

        let err = lifecycle
            .create(&buyer, ActorId::new(), Decimal::ONE, "x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::RoleNotPermitted { .. }));
    }

    #[tokio::test]
    async fn intake_happy_path() {
        let (lifecycle, vendor, order) = setup().await;

        let order = lifecycle.confirm(&vendor, order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);

        let order = lifecycle.mark_paid(&vendor, order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn illegal_edge_rejected() {
        let (lifecycle, vendor, order) = setup().await;

        // PENDING -> PAID skips CONFIRMED.
        let err = lifecycle
            .transition(&vendor, order.id, OrderStatus::Pending, OrderStatus::Paid, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn stale_expected_status_rejected() {
        let (lifecycle, vendor, order) = setup().await;
        lifecycle.confirm(&vendor, order.id).await.unwrap();

        // A second caller still believes the order is PENDING.
        let err = lifecycle.confirm(&vendor, order.id).await.unwrap_err();
        assert!(matches!(
            err,
            PaygateError::OrderMoved {
                expected: OrderStatus::Pending,
                actual: OrderStatus::Confirmed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cross_tenant_access_rejected() {
        let (lifecycle, _, order) = setup().await;
        let outsider = vendor_ctx(TenantId::new());

        let err = lifecycle.load(&outsider, order.id).await.unwrap_err();
        assert!(matches!(err, PaygateError::CrossTenant { .. }));

        let err = lifecycle.confirm(&outsider, order.id).await.unwrap_err();
        assert!(matches!(err, PaygateError::CrossTenant { .. }));
    }

    #[tokio::test]
    async fn attach_receipt_once() {
        let (lifecycle, vendor, order) = setup().await;
        lifecycle.confirm(&vendor, order.id).await.unwrap();
        lifecycle.mark_paid(&vendor, order.id).await.unwrap();

        let order = lifecycle
            .attach_receipt(&vendor, order.id, ReceiptId::new())
            .await
            .unwrap();
        assert!(order.receipt_id.is_some());

        let err = lifecycle
            .attach_receipt(&vendor, order.id, ReceiptId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::DuplicateReceipt(_)));
    }

    #[tokio::test]
    async fn missing_order_not_found() {
        let (lifecycle, vendor, _) = setup().await;
        let err = lifecycle.load(&vendor, OrderId::new()).await.unwrap_err();
        assert!(matches!(err, PaygateError::OrderNotFound(_)));
    }
}
