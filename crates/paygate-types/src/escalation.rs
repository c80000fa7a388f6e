//! Escalation types: requests for a human decision on an order.
//!
//! An escalation is created when the auto-escalation policy fires and is
//! resolved exactly once by an OTP-authenticated CEO — or lapses past its
//! hard expiry, checked lazily at decision time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ActorId, EscalationId, OrderId, TenantId};

/// Why the order could not be auto-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscalationReason {
    /// The order amount met or exceeded the high-value threshold.
    HighValue,
    /// The vendor explicitly flagged the receipt as suspicious.
    FlaggedByVendor,
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighValue => write!(f, "HIGH_VALUE"),
            Self::FlaggedByVendor => write!(f, "FLAGGED_BY_VENDOR"),
        }
    }
}

/// Lifecycle status of an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum EscalationStatus {
    /// Awaiting the CEO's decision.
    Pending,
    /// The CEO approved; the order is fit for fulfillment.
    Approved,
    /// The CEO rejected; the order is void.
    Rejected,
    /// The decision window lapsed before anyone decided.
    Expired,
}

impl EscalationStatus {
    /// Can an escalation in this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Approved | Self::Rejected | Self::Expired
            )
        )
    }

    /// A decided or lapsed escalation is immutable.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self != Self::Pending
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// The CEO's verdict on an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Release the order for fulfillment.
    Approve,
    /// Void the order.
    Reject,
}

impl Decision {
    /// The escalation status this decision resolves to.
    #[must_use]
    pub fn escalation_status(self) -> EscalationStatus {
        match self {
            Self::Approve => EscalationStatus::Approved,
            Self::Reject => EscalationStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "APPROVE"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

/// A request for a human decision on an order/receipt pair.
///
/// `tenant_id` always equals the order's tenant id — the verification
/// engine copies it at creation and the tenancy guard enforces it on
/// every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub id: EscalationId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub vendor_id: ActorId,
    pub buyer_id: ActorId,
    /// The order's recorded amount at escalation time.
    pub amount: Decimal,
    /// Raw buyer contact, copied from the order. Never leaves the
    /// escalation component unmasked.
    pub buyer_contact: String,
    pub reason: EscalationReason,
    pub status: EscalationStatus,
    pub created_at: DateTime<Utc>,
    /// Hard decision deadline, independent of any OTP TTL.
    pub expires_at: DateTime<Utc>,
    pub decision_notes: Option<String>,
    pub decided_by: Option<ActorId>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Escalation {
    /// Whether the decision window has lapsed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether a decision may still be taken: pending and inside the window.
    #[must_use]
    pub fn is_decidable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == EscalationStatus::Pending && !self.is_expired_at(now)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Escalation {
    pub fn dummy_pending(tenant_id: TenantId, order_id: OrderId, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: EscalationId::new(),
            tenant_id,
            order_id,
            vendor_id: ActorId::new(),
            buyer_id: ActorId::new(),
            amount,
            buyer_contact: "+15550001234".to_string(),
            reason: EscalationReason::HighValue,
            status: EscalationStatus::Pending,
            created_at: now,
            expires_at: now + chrono::Duration::hours(48),
            decision_notes: None,
            decided_by: None,
            decided_at: None,
        }
    }
}
