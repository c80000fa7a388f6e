//! Escalation manager — owns the OTP-gated approval/rejection flow and
//! reflects the outcome into order state.
//!
//! A decision runs five steps, in order:
//! 1. Verify (and thereby consume) the CEO's one-time code
//! 2. Load the escalation, tenancy- and role-guard the caller
//! 3. Write the terminal escalation status (conditional on `PENDING`)
//! 4. Move the order through the lifecycle manager
//! 5. Dispatch notifications, best-effort
//!
//! A replayed code dies at step 1 because success deleted the record.
//! A lapsed escalation is marked `EXPIRED` lazily at step 2 — there is
//! no background sweeper.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use paygate_core::{Notifier, OrderLifecycle, tenancy};
use paygate_store::RecordStore;
use paygate_types::{
    ActorContext, ActorId, ActorRole, Decision, Escalation, EscalationId, EscalationReason,
    EscalationStatus, OrderId, OrderStatus, PaygateConfig, PaygateError, Result,
};

use crate::masking::mask_contact;
use crate::otp::OtpLedger;

/// One row of the CEO's pending-decision list. Buyer contact is masked.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationSummary {
    pub id: EscalationId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub reason: EscalationReason,
    pub status: EscalationStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub expires_at: chrono::DateTime<Utc>,
    pub buyer_contact: String,
}

/// Full escalation view for one decision. Buyer contact is masked.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationDetail {
    pub id: EscalationId,
    pub order_id: OrderId,
    pub vendor_id: ActorId,
    pub buyer_id: ActorId,
    pub amount: Decimal,
    pub reason: EscalationReason,
    pub status: EscalationStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub expires_at: chrono::DateTime<Utc>,
    pub buyer_contact: String,
    pub decision_notes: Option<String>,
    pub decided_by: Option<ActorId>,
    pub decided_at: Option<chrono::DateTime<Utc>>,
}

/// What a decision did.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub escalation_id: EscalationId,
    pub order_id: OrderId,
    pub decision: Decision,
    pub order_status: OrderStatus,
    pub buyer_notified: bool,
}

/// The OTP-gated decision plane.
pub struct EscalationManager<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    lifecycle: OrderLifecycle<S>,
    otp: OtpLedger<S>,
    otp_ttl: Duration,
}

impl<S: RecordStore, N: Notifier> EscalationManager<S, N> {
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &PaygateConfig) -> Self {
        Self {
            lifecycle: OrderLifecycle::new(Arc::clone(&store)),
            otp: OtpLedger::new(Arc::clone(&store), config.otp.clone()),
            otp_ttl: Duration::seconds(config.otp.ttl_secs),
            store,
            notifier,
        }
    }

    /// The CEO's open decisions, tenant-scoped, masked, newest-last.
    /// Already-lapsed entries are filtered out (lazy expiry; the record
    /// itself is only marked `EXPIRED` when a decision is attempted).
    pub async fn pending(&self, ceo: &ActorContext) -> Result<Vec<EscalationSummary>> {
        tenancy::require_role(ceo, ActorRole::Ceo)?;
        let now = Utc::now();
        let escalations = self.store.list_escalations(ceo.tenant).await?;
        Ok(escalations
            .into_iter()
            .filter(|e| e.is_decidable_at(now))
            .map(summarize)
            .collect())
    }

    /// Full view of one escalation, tenancy-guarded and masked.
    pub async fn details(
        &self,
        ceo: &ActorContext,
        escalation_id: EscalationId,
    ) -> Result<EscalationDetail> {
        tenancy::require_role(ceo, ActorRole::Ceo)?;
        let escalation = self.load(ceo, escalation_id).await?;
        Ok(detail(escalation))
    }

    /// Issue a fresh decision code for this CEO. The code is handed back
    /// for out-of-band delivery and is never stored in plaintext.
    pub async fn request_decision_code(&self, ceo: &ActorContext) -> Result<String> {
        tenancy::require_role(ceo, ActorRole::Ceo)?;
        self.otp.issue(ceo.actor, ActorRole::Ceo, self.otp_ttl).await
    }

    /// Decide an escalation. See the module docs for the five steps.
    ///
    /// # Errors
    /// - `Credential` if the code fails (nothing else is touched)
    /// - `EscalationNotFound`, `CrossTenant`, `RoleNotPermitted`
    /// - `EscalationExpired` past the decision deadline, even with a
    ///   valid code
    /// - `EscalationAlreadyDecided` on any second decision
    pub async fn decide(
        &self,
        ceo: &ActorContext,
        escalation_id: EscalationId,
        otp_code: &str,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<DecisionOutcome> {
        // Step 1: the code gate. Consumes the code on success; any
        // failure aborts before state is read, let alone written.
        self.otp.verify(ceo.actor, ActorRole::Ceo, otp_code).await?;

        // Step 2: load and guard.
        tenancy::require_role(ceo, ActorRole::Ceo)?;
        let mut escalation = self.load(ceo, escalation_id).await?;
        let now = Utc::now();

        if escalation.status == EscalationStatus::Pending && escalation.is_expired_at(now) {
            self.lapse(&mut escalation).await?;
            return Err(PaygateError::EscalationExpired(escalation_id));
        }
        if escalation.status != EscalationStatus::Pending {
            return Err(PaygateError::EscalationAlreadyDecided {
                escalation: escalation_id,
                status: escalation.status,
            });
        }

        // Step 3: terminal escalation write, conditional on PENDING.
        escalation.status = decision.escalation_status();
        escalation.decided_by = Some(ceo.actor);
        escalation.decision_notes = notes;
        escalation.decided_at = Some(now);
        self.store
            .update_escalation(&escalation, EscalationStatus::Pending)
            .await?;

        // Step 4: reflect into order state.
        let order_status = match decision {
            Decision::Approve => OrderStatus::Approved,
            Decision::Reject => OrderStatus::Rejected,
        };
        let order = self
            .lifecycle
            .transition(
                ceo,
                escalation.order_id,
                OrderStatus::Escalated,
                order_status,
                Some(format!("CEO decision: {decision}")),
            )
            .await?;

        tracing::info!(
            escalation = %escalation_id,
            order = %order.id,
            decision = %decision,
            actor = %ceo.actor,
            amount = %escalation.amount,
            "Escalation decided"
        );

        // Step 5: best-effort notifications. The decision is already
        // durably committed; a delivery failure is logged and swallowed.
        let buyer_notified = self
            .notify_buyer(&escalation, decision, &order.buyer_contact)
            .await;
        self.notify_resolution(ceo, &escalation, decision).await;

        Ok(DecisionOutcome {
            escalation_id,
            order_id: order.id,
            decision,
            order_status,
            buyer_notified,
        })
    }

    /// Tenancy-guarded read.
    async fn load(&self, ceo: &ActorContext, escalation_id: EscalationId) -> Result<Escalation> {
        let escalation = self
            .store
            .get_escalation(escalation_id)
            .await?
            .ok_or(PaygateError::EscalationNotFound(escalation_id))?;
        tenancy::authorize(ceo.tenant, escalation.tenant_id)?;
        Ok(escalation)
    }

    /// Lazily mark a lapsed escalation `EXPIRED`. A conditional-update
    /// conflict means someone else resolved it first; that race is fine —
    /// the caller re-reads and reports what it found.
    async fn lapse(&self, escalation: &mut Escalation) -> Result<()> {
        escalation.status = EscalationStatus::Expired;
        match self
            .store
            .update_escalation(escalation, EscalationStatus::Pending)
            .await
        {
            Ok(()) => {
                tracing::info!(escalation = %escalation.id, "Escalation lapsed");
                Ok(())
            }
            Err(PaygateError::EscalationAlreadyDecided { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn notify_buyer(
        &self,
        escalation: &Escalation,
        decision: Decision,
        buyer_contact: &str,
    ) -> bool {
        let message = match decision {
            Decision::Approve => format!(
                "Payment confirmed — order {} is being prepared",
                escalation.order_id
            ),
            Decision::Reject => format!(
                "Payment could not be confirmed — order {} was declined",
                escalation.order_id
            ),
        };
        match self
            .notifier
            .send_buyer_notification(buyer_contact, &message)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(order = %escalation.order_id, error = %err, "Buyer notification failed");
                false
            }
        }
    }

    async fn notify_resolution(
        &self,
        ceo: &ActorContext,
        escalation: &Escalation,
        decision: Decision,
    ) {
        if let Err(err) = self
            .notifier
            .send_resolution_notification(
                &ceo.actor.to_string(),
                escalation.id,
                escalation.order_id,
                decision,
                escalation.amount,
            )
            .await
        {
            tracing::warn!(escalation = %escalation.id, error = %err, "Resolution notification failed");
        }
    }
}

fn summarize(e: Escalation) -> EscalationSummary {
    EscalationSummary {
        id: e.id,
        order_id: e.order_id,
        amount: e.amount,
        reason: e.reason,
        status: e.status,
        created_at: e.created_at,
        expires_at: e.expires_at,
        buyer_contact: mask_contact(&e.buyer_contact),
    }
}

fn detail(e: Escalation) -> EscalationDetail {
    EscalationDetail {
        id: e.id,
        order_id: e.order_id,
        vendor_id: e.vendor_id,
        buyer_id: e.buyer_id,
        amount: e.amount,
        reason: e.reason,
        status: e.status,
        created_at: e.created_at,
        expires_at: e.expires_at,
        buyer_contact: mask_contact(&e.buyer_contact),
        decision_notes: e.decision_notes,
        decided_by: e.decided_by,
        decided_at: e.decided_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_core::notify::test_support::{FailingNotifier, RecordingNotifier};
    use paygate_store::MemoryStore;
    use paygate_types::{Order, TenantId};

    struct Fixture {
        manager: EscalationManager<MemoryStore, RecordingNotifier>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        ceo: ActorContext,
        escalation: Escalation,
        order: Order,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = EscalationManager::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            &PaygateConfig::default(),
        );

        let tenant = TenantId::new();
        let order = Order::dummy(tenant, Decimal::new(2_500_000, 0), OrderStatus::Escalated);
        let mut escalation =
            Escalation::dummy_pending(tenant, order.id, Decimal::new(2_500_000, 0));
        escalation.vendor_id = order.vendor_id;
        escalation.buyer_id = order.buyer_id;
        escalation.buyer_contact = order.buyer_contact.clone();
        store.put_order(&order).await.unwrap();
        store.put_escalation(&escalation).await.unwrap();

        let ceo = ActorContext::new(ActorId::new(), tenant, ActorRole::Ceo);
        Fixture {
            manager,
            store,
            notifier,
            ceo,
            escalation,
            order,
        }
    }

    #[tokio::test]
    async fn approve_reflects_into_order() {
        let fx = fixture().await;
        let code = fx.manager.request_decision_code(&fx.ceo).await.unwrap();

        let outcome = fx
            .manager
            .decide(
                &fx.ceo,
                fx.escalation.id,
                &code,
                Decision::Approve,
                Some("looks legitimate".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.decision, Decision::Approve);
        assert_eq!(outcome.order_status, OrderStatus::Approved);
        assert!(outcome.buyer_notified);

        let escalation = fx
            .store
            .get_escalation(fx.escalation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(escalation.status, EscalationStatus::Approved);
        assert_eq!(escalation.decided_by, Some(fx.ceo.actor));
        assert_eq!(
            escalation.decision_notes.as_deref(),
            Some("looks legitimate")
        );
        assert!(escalation.decided_at.is_some());

        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
        assert!(order.status.is_releasable());

        assert_eq!(fx.notifier.buyer_message_count(), 1);
        assert_eq!(fx.notifier.resolution_count(), 1);
    }

    #[tokio::test]
    async fn reject_voids_the_order() {
        let fx = fixture().await;
        let code = fx.manager.request_decision_code(&fx.ceo).await.unwrap();

        let outcome = fx
            .manager
            .decide(&fx.ceo, fx.escalation.id, &code, Decision::Reject, None)
            .await
            .unwrap();

        assert_eq!(outcome.order_status, OrderStatus::Rejected);
        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Rejected);
    }

    #[tokio::test]
    async fn bad_code_aborts_with_no_state_change() {
        let fx = fixture().await;
        fx.manager.request_decision_code(&fx.ceo).await.unwrap();

        let err = fx
            .manager
            .decide(
                &fx.ceo,
                fx.escalation.id,
                "WRONGCODE",
                Decision::Approve,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::Credential { .. }));

        let escalation = fx
            .store
            .get_escalation(fx.escalation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(escalation.status, EscalationStatus::Pending);
        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Escalated);
        assert_eq!(fx.notifier.buyer_message_count(), 0);
    }

    #[tokio::test]
    async fn double_decide_is_invalid_state() {
        let fx = fixture().await;
        let code = fx.manager.request_decision_code(&fx.ceo).await.unwrap();
        fx.manager
            .decide(&fx.ceo, fx.escalation.id, &code, Decision::Approve, None)
            .await
            .unwrap();

        let code = fx.manager.request_decision_code(&fx.ceo).await.unwrap();
        let err = fx
            .manager
            .decide(&fx.ceo, fx.escalation.id, &code, Decision::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaygateError::EscalationAlreadyDecided {
                status: EscalationStatus::Approved,
                ..
            }
        ));

        // Nothing moved.
        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
    }

    #[tokio::test]
    async fn expired_escalation_lapses_at_decide_time() {
        let fx = fixture().await;

        let mut lapsed = fx.escalation.clone();
        lapsed.expires_at = Utc::now() - Duration::minutes(1);
        fx.store
            .update_escalation(&lapsed, EscalationStatus::Pending)
            .await
            .unwrap();

        let code = fx.manager.request_decision_code(&fx.ceo).await.unwrap();
        let err = fx
            .manager
            .decide(&fx.ceo, fx.escalation.id, &code, Decision::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::EscalationExpired(_)));

        let escalation = fx
            .store
            .get_escalation(fx.escalation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(escalation.status, EscalationStatus::Expired);
        // The order stays ESCALATED: expiry never silently decides it.
        let order = fx.store.get_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Escalated);
    }

    #[tokio::test]
    async fn pending_masks_contact_and_filters_lapsed() {
        let fx = fixture().await;

        let mut lapsed = Escalation::dummy_pending(
            fx.ceo.tenant,
            OrderId::new(),
            Decimal::new(1_200_000, 0),
        );
        lapsed.expires_at = Utc::now() - Duration::minutes(1);
        fx.store.put_escalation(&lapsed).await.unwrap();

        let pending = fx.manager.pending(&fx.ceo).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, fx.escalation.id);
        assert_eq!(pending[0].buyer_contact, "****1234");
        assert!(!pending[0].buyer_contact.contains("555000"));
    }

    #[tokio::test]
    async fn pending_is_tenant_scoped() {
        let fx = fixture().await;
        let other_ceo = ActorContext::new(ActorId::new(), TenantId::new(), ActorRole::Ceo);
        assert!(fx.manager.pending(&other_ceo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn details_guarded_and_masked() {
        let fx = fixture().await;
        let detail = fx
            .manager
            .details(&fx.ceo, fx.escalation.id)
            .await
            .unwrap();
        assert_eq!(detail.buyer_contact, "****1234");
        assert_eq!(detail.amount, Decimal::new(2_500_000, 0));

        let outsider = ActorContext::new(ActorId::new(), TenantId::new(), ActorRole::Ceo);
        let err = fx
            .manager
            .details(&outsider, fx.escalation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PaygateError::CrossTenant { .. }));
    }

    #[tokio::test]
    async fn reads_require_ceo_role() {
        let fx = fixture().await;
        let vendor = ActorContext::new(ActorId::new(), fx.ceo.tenant, ActorRole::Vendor);
        assert!(matches!(
            fx.manager.pending(&vendor).await.unwrap_err(),
            PaygateError::RoleNotPermitted { .. }
        ));
        assert!(matches!(
            fx.manager.request_decision_code(&vendor).await.unwrap_err(),
            PaygateError::RoleNotPermitted { .. }
        ));
    }

    #[tokio::test]
    async fn notification_failure_never_fails_the_decision() {
        let store = Arc::new(MemoryStore::new());
        let manager = EscalationManager::new(
            Arc::clone(&store),
            Arc::new(FailingNotifier),
            &PaygateConfig::default(),
        );

        let tenant = TenantId::new();
        let order = Order::dummy(tenant, Decimal::new(2_000_000, 0), OrderStatus::Escalated);
        let escalation = Escalation::dummy_pending(tenant, order.id, order.amount);
        store.put_order(&order).await.unwrap();
        store.put_escalation(&escalation).await.unwrap();

        let ceo = ActorContext::new(ActorId::new(), tenant, ActorRole::Ceo);
        let code = manager.request_decision_code(&ceo).await.unwrap();
        let outcome = manager
            .decide(&ceo, escalation.id, &code, Decision::Approve, None)
            .await
            .unwrap();

        // Committed despite the dispatcher being down.
        assert!(!outcome.buyer_notified);
        assert_eq!(outcome.order_status, OrderStatus::Approved);
        let stored = store.get_escalation(escalation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EscalationStatus::Approved);
    }
}
