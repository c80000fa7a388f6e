//! Receipt verification engine.
//!
//! Applies a reviewer's decision to a receipt and, per the auto-escalation
//! policy, either finalizes the order or hands off to the escalation
//! plane. The order transition is the linearization point: of two
//! reviewers racing on the same receipt, the first writer wins and the
//! second observes an `InvalidState`-kind error.

use std::sync::Arc;

use chrono::{Duration, Utc};

use paygate_core::{Notifier, OrderLifecycle};
use paygate_store::RecordStore;
use paygate_types::{
    ActorContext, Escalation, EscalationId, EscalationStatus, Order, OrderId, OrderStatus,
    PaygateConfig, PaygateError, PolicyConfig, Receipt, ReceiptId, ReceiptStatus, Result,
    ReviewAction,
};
use serde::Serialize;

use crate::policy::requires_escalation;

/// What a review did: the resolved receipt/order statuses, and whether the
/// order now awaits a CEO decision.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub receipt_id: ReceiptId,
    pub order_id: OrderId,
    pub receipt_status: ReceiptStatus,
    pub order_status: OrderStatus,
    pub requires_ceo_approval: bool,
    pub escalation_id: Option<EscalationId>,
}

/// Applies reviewer decisions to receipts.
pub struct VerificationEngine<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    lifecycle: OrderLifecycle<S>,
    policy: PolicyConfig,
    escalation_ttl: Duration,
}

impl<S: RecordStore, N: Notifier> VerificationEngine<S, N> {
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &PaygateConfig) -> Self {
        Self {
            lifecycle: OrderLifecycle::new(Arc::clone(&store)),
            store,
            notifier,
            policy: config.policy.clone(),
            escalation_ttl: Duration::hours(config.escalation.ttl_hours),
        }
    }

    /// Register a confirmed receipt upload against a `PAID` order.
    ///
    /// Creates the receipt in `PENDING_REVIEW` with the OCR service's
    /// opaque metadata attached, and links it to the order (1:1).
    ///
    /// # Errors
    /// - `OrderNotFound`, `CrossTenant`
    /// - `NotResourceOwner` if the uploader is not the order's buyer
    /// - `OrderMoved` if the order is not currently `PAID`
    /// - `DuplicateReceipt` if the order already has a receipt
    pub async fn record_upload(
        &self,
        buyer: &ActorContext,
        order_id: OrderId,
        ocr_metadata: serde_json::Value,
    ) -> Result<Receipt> {
        let order = self.lifecycle.load(buyer, order_id).await?;
        if buyer.actor != order.buyer_id {
            return Err(PaygateError::NotResourceOwner);
        }
        if order.status != OrderStatus::Paid {
            return Err(PaygateError::OrderMoved {
                order: order_id,
                expected: OrderStatus::Paid,
                actual: order.status,
            });
        }
        if order.receipt_id.is_some() {
            return Err(PaygateError::DuplicateReceipt(order_id));
        }

        let receipt = Receipt {
            id: ReceiptId::new(),
            tenant_id: order.tenant_id,
            order_id,
            buyer_id: order.buyer_id,
            reviewer_id: order.vendor_id,
            status: ReceiptStatus::PendingReview,
            reviewer_notes: None,
            reviewed_at: None,
            ocr_metadata,
            created_at: Utc::now(),
        };
        self.store.put_receipt(&receipt).await?;
        self.lifecycle
            .attach_receipt(buyer, order_id, receipt.id)
            .await?;

        tracing::info!(receipt = %receipt.id, order = %order_id, "Receipt upload recorded");
        Ok(receipt)
    }

    /// Apply a reviewer decision to a pending receipt.
    ///
    /// The auto-escalation policy is evaluated before any commit, against
    /// the order's recorded amount. `Flag` always escalates, whatever the
    /// amount.
    ///
    /// # Errors
    /// - `ReceiptNotFound`, `OrderNotFound`, `CrossTenant`
    /// - `NotResourceOwner` if the caller is not the assigned reviewer
    /// - `ReceiptAlreadyResolved` on any reprocessing attempt
    /// - `MissingNotes` when rejecting or flagging without notes
    /// - `OrderMoved` when another reviewer got there first
    pub async fn verify_receipt(
        &self,
        reviewer: &ActorContext,
        receipt_id: ReceiptId,
        action: ReviewAction,
        notes: Option<String>,
    ) -> Result<ReviewOutcome> {
        let mut receipt = self
            .store
            .get_receipt(receipt_id)
            .await?
            .ok_or(PaygateError::ReceiptNotFound(receipt_id))?;
        paygate_core::tenancy::authorize(reviewer.tenant, receipt.tenant_id)?;
        if reviewer.actor != receipt.reviewer_id {
            return Err(PaygateError::NotResourceOwner);
        }
        if receipt.status != ReceiptStatus::PendingReview {
            return Err(PaygateError::ReceiptAlreadyResolved {
                receipt: receipt_id,
                status: receipt.status,
            });
        }
        if matches!(action, ReviewAction::Reject | ReviewAction::Flag)
            && notes.as_deref().is_none_or(|n| n.trim().is_empty())
        {
            return Err(PaygateError::MissingNotes(action));
        }

        let order = self.lifecycle.load(reviewer, receipt.order_id).await?;

        // Policy first, commits after — and against the recorded amount.
        match requires_escalation(order.amount, action, self.policy.high_value_threshold) {
            Some(reason) => {
                let order = self
                    .lifecycle
                    .transition(
                        reviewer,
                        order.id,
                        OrderStatus::Paid,
                        OrderStatus::Escalated,
                        Some(format!("escalated to CEO: {reason}")),
                    )
                    .await?;

                let now = Utc::now();
                let escalation = Escalation {
                    id: EscalationId::new(),
                    tenant_id: order.tenant_id,
                    order_id: order.id,
                    vendor_id: order.vendor_id,
                    buyer_id: order.buyer_id,
                    amount: order.amount,
                    buyer_contact: order.buyer_contact.clone(),
                    reason,
                    status: EscalationStatus::Pending,
                    created_at: now,
                    expires_at: now + self.escalation_ttl,
                    decision_notes: None,
                    decided_by: None,
                    decided_at: None,
                };
                self.store.put_escalation(&escalation).await?;

                receipt.status = ReceiptStatus::Flagged;
                receipt.reviewer_notes = notes;
                receipt.reviewed_at = Some(now);
                self.store
                    .update_receipt(&receipt, ReceiptStatus::PendingReview)
                    .await?;

                tracing::info!(
                    receipt = %receipt_id,
                    order = %order.id,
                    escalation = %escalation.id,
                    reason = %reason,
                    amount = %order.amount,
                    "Receipt escalated to CEO"
                );

                Ok(ReviewOutcome {
                    receipt_id,
                    order_id: order.id,
                    receipt_status: ReceiptStatus::Flagged,
                    order_status: OrderStatus::Escalated,
                    requires_ceo_approval: true,
                    escalation_id: Some(escalation.id),
                })
            }
            None => {
                let (receipt_status, order_status) = match action {
                    ReviewAction::Approve => (ReceiptStatus::Approved, OrderStatus::Verified),
                    ReviewAction::Reject => (ReceiptStatus::Rejected, OrderStatus::Cancelled),
                    // The policy routes every Flag into the escalation arm.
                    ReviewAction::Flag => unreachable!("flag always escalates"),
                };

                let order = self
                    .lifecycle
                    .transition(
                        reviewer,
                        order.id,
                        OrderStatus::Paid,
                        order_status,
                        Some(format!("receipt review: {action}")),
                    )
                    .await?;

                receipt.status = receipt_status;
                receipt.reviewer_notes = notes;
                receipt.reviewed_at = Some(Utc::now());
                self.store
                    .update_receipt(&receipt, ReceiptStatus::PendingReview)
                    .await?;

                tracing::info!(
                    receipt = %receipt_id,
                    order = %order.id,
                    status = %receipt_status,
                    "Receipt resolved"
                );

                self.notify_buyer(&order, order_status).await;

                Ok(ReviewOutcome {
                    receipt_id,
                    order_id: order.id,
                    receipt_status,
                    order_status,
                    requires_ceo_approval: false,
                    escalation_id: None,
                })
            }
        }
    }

    /// Best-effort buyer dispatch. The decision is already committed, so
    /// a delivery failure is logged and swallowed.
    async fn notify_buyer(&self, order: &Order, status: OrderStatus) {
        let message = match status {
            OrderStatus::Verified => format!("Payment verified — order {} is being prepared", order.id),
            OrderStatus::Cancelled => format!("Receipt rejected — order {} was cancelled", order.id),
            _ => return,
        };
        if let Err(err) = self
            .notifier
            .send_buyer_notification(&order.buyer_contact, &message)
            .await
        {
            tracing::warn!(order = %order.id, error = %err, "Buyer notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_core::notify::test_support::RecordingNotifier;
    use paygate_store::MemoryStore;
    use paygate_types::{ActorRole, Order, TenantId};
    use rust_decimal::Decimal;

    struct Fixture {
        engine: VerificationEngine<MemoryStore, RecordingNotifier>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        reviewer: ActorContext,
        order: Order,
        receipt: Receipt,
    }

    async fn fixture(amount: Decimal) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = VerificationEngine::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            &PaygateConfig::default(),
        );

        let tenant = TenantId::new();
        let order = Order::dummy_paid(tenant, amount);
        let receipt =
            Receipt::dummy_pending(tenant, order.id, order.buyer_id, order.vendor_id);
        store.put_order(&order).await.unwrap();
        store.put_receipt(&receipt).await.unwrap();

        let reviewer = ActorContext::new(order.vendor_id, tenant, ActorRole::Vendor);
        Fixture {
            engine,
            store,
            notifier,
            reviewer,
            order,
            receipt,
        }
    }

    #[tokio::test]
    async fn approve_below_threshold_releases_order() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let outcome = fx
            .engine
            .verify_receipt(&fx.reviewer, fx.receipt.id, ReviewAction::Approve, None)
            .await
            .unwrap();

        assert!(!outcome.requires_ceo_approval);
        assert_eq!(outcome.receipt_status, ReceiptStatus::Approved);
        assert_eq!(outcome.order_status, OrderStatus::Verified);
        assert!(outcome.escalation_id.is_none());

        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Verified);
        assert_eq!(fx.notifier.buyer_message_count(), 1);
    }

    #[tokio::test]
    async fn reject_requires_notes() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let err = fx
            .engine
            .verify_receipt(&fx.reviewer, fx.receipt.id, ReviewAction::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::MissingNotes(ReviewAction::Reject)));

        let err = fx
            .engine
            .verify_receipt(
                &fx.reviewer,
                fx.receipt.id,
                ReviewAction::Flag,
                Some("   ".to_string()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::MissingNotes(ReviewAction::Flag)));
    }

    #[tokio::test]
    async fn reject_cancels_and_notifies() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let outcome = fx
            .engine
            .verify_receipt(
                &fx.reviewer,
                fx.receipt.id,
                ReviewAction::Reject,
                Some("no transfer received".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.order_status, OrderStatus::Cancelled);
        assert_eq!(outcome.receipt_status, ReceiptStatus::Rejected);
        let receipt = fx.store.get_receipt(fx.receipt.id).await.unwrap().unwrap();
        assert_eq!(
            receipt.reviewer_notes.as_deref(),
            Some("no transfer received")
        );
        assert_eq!(fx.notifier.buyer_message_count(), 1);
    }

    #[tokio::test]
    async fn high_value_approve_escalates() {
        let fx = fixture(Decimal::new(2_500_000, 0)).await;
        let outcome = fx
            .engine
            .verify_receipt(&fx.reviewer, fx.receipt.id, ReviewAction::Approve, None)
            .await
            .unwrap();

        assert!(outcome.requires_ceo_approval);
        assert_eq!(outcome.receipt_status, ReceiptStatus::Flagged);
        assert_eq!(outcome.order_status, OrderStatus::Escalated);

        let escalation = fx
            .store
            .get_escalation(outcome.escalation_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(escalation.reason, paygate_types::EscalationReason::HighValue);
        assert_eq!(escalation.amount, Decimal::new(2_500_000, 0));
        assert_eq!(escalation.tenant_id, fx.order.tenant_id);

        // No buyer message on the escalation path.
        assert_eq!(fx.notifier.buyer_message_count(), 0);
    }

    #[tokio::test]
    async fn flag_escalates_at_trivial_amount() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let outcome = fx
            .engine
            .verify_receipt(
                &fx.reviewer,
                fx.receipt.id,
                ReviewAction::Flag,
                Some("suspicious".to_string()),
            )
            .await
            .unwrap();

        assert!(outcome.requires_ceo_approval);
        let escalation = fx
            .store
            .get_escalation(outcome.escalation_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            escalation.reason,
            paygate_types::EscalationReason::FlaggedByVendor
        );
    }

    #[tokio::test]
    async fn resolved_receipt_is_terminal() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        fx.engine
            .verify_receipt(&fx.reviewer, fx.receipt.id, ReviewAction::Approve, None)
            .await
            .unwrap();

        let err = fx
            .engine
            .verify_receipt(&fx.reviewer, fx.receipt.id, ReviewAction::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::ReceiptAlreadyResolved { .. }));
    }

    #[tokio::test]
    async fn wrong_reviewer_rejected() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let impostor = ActorContext::new(
            paygate_types::ActorId::new(),
            fx.reviewer.tenant,
            ActorRole::Vendor,
        );
        let err = fx
            .engine
            .verify_receipt(&impostor, fx.receipt.id, ReviewAction::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::NotResourceOwner));
    }

    #[tokio::test]
    async fn cross_tenant_reviewer_rejected() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let outsider = ActorContext::new(fx.reviewer.actor, TenantId::new(), ActorRole::Vendor);
        let err = fx
            .engine
            .verify_receipt(&outsider, fx.receipt.id, ReviewAction::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::CrossTenant { .. }));
    }

    #[tokio::test]
    async fn record_upload_links_receipt() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let buyer = ActorContext::new(fx.order.buyer_id, fx.order.tenant_id, ActorRole::Buyer);

        // The fixture order has no receipt linked yet.
        let receipt = fx
            .engine
            .record_upload(
                &buyer,
                fx.order.id,
                serde_json::json!({ "amount_guess": "5000", "confidence": 0.77 }),
            )
            .await
            .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::PendingReview);
        assert_eq!(receipt.reviewer_id, fx.order.vendor_id);

        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.receipt_id, Some(receipt.id));

        // Second upload violates the 1:1 invariant.
        let err = fx
            .engine
            .record_upload(&buyer, fx.order.id, serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::DuplicateReceipt(_)));
    }

    #[tokio::test]
    async fn record_upload_requires_the_buyer() {
        let fx = fixture(Decimal::new(5_000, 0)).await;
        let stranger = ActorContext::new(
            paygate_types::ActorId::new(),
            fx.order.tenant_id,
            ActorRole::Buyer,
        );
        let err = fx
            .engine
            .record_upload(&stranger, fx.order.id, serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::NotResourceOwner));
    }
}
