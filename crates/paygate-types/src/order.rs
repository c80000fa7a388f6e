//! Order types and the order status state machine.
//!
//! An order is a transaction between a buyer and a vendor under one tenant.
//! Its status only ever advances along the closed edge set below, and only
//! the Order Lifecycle Manager persists status changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ActorId, OrderId, ReceiptId, TenantId};

/// Lifecycle status of an order.
///
/// ```text
///   PENDING ──▶ CONFIRMED ──▶ PAID ──▶ VERIFIED
///                              │  ├──▶ CANCELLED
///                              │  └──▶ ESCALATED ──▶ APPROVED
///                              ▼                └──▶ REJECTED
/// ```
///
/// Transitions are **monotonic** (never go backwards). `VERIFIED` and
/// `APPROVED` both release the order for fulfillment; `CANCELLED` and
/// `REJECTED` void it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created by the vendor; awaiting buyer confirmation.
    Pending,
    /// The buyer confirmed the purchase.
    Confirmed,
    /// The buyer claims payment was sent; a receipt is expected.
    Paid,
    /// The vendor verified the receipt. Fit for fulfillment.
    Verified,
    /// The vendor rejected the receipt. Void.
    Cancelled,
    /// Awaiting a CEO decision.
    Escalated,
    /// The CEO approved the escalation. Fit for fulfillment.
    Approved,
    /// The CEO rejected the escalation. Void.
    Rejected,
}

impl OrderStatus {
    /// Can an order in this status transition to the given target status?
    ///
    /// Anything not explicitly listed here is illegal.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Paid)
                | (Self::Paid, Self::Verified | Self::Cancelled | Self::Escalated)
                | (Self::Escalated, Self::Approved | Self::Rejected)
        )
    }

    /// Terminal statuses accept no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Verified | Self::Cancelled | Self::Approved | Self::Rejected
        )
    }

    /// Whether the order may be handed to fulfillment.
    #[must_use]
    pub fn is_releasable(&self) -> bool {
        matches!(self, Self::Verified | Self::Approved)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Paid => write!(f, "PAID"),
            Self::Verified => write!(f, "VERIFIED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Escalated => write!(f, "ESCALATED"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// A transaction between a buyer and a vendor under one tenant.
///
/// `tenant_id` is immutable after creation — the store's conditional-update
/// path rejects any write that changes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub vendor_id: ActorId,
    pub buyer_id: ActorId,
    /// Fixed-point amount recorded at creation. The auto-escalation policy
    /// is evaluated against this value, never a buyer-submitted figure.
    pub amount: Decimal,
    /// Raw buyer contact handle captured at intake. Masked whenever it
    /// leaves the escalation component.
    pub buyer_contact: String,
    pub status: OrderStatus,
    /// Append-only audit notes, one per state-affecting action.
    pub notes: Vec<String>,
    /// The receipt attached to this order, if one was uploaded (1:1).
    pub receipt_id: Option<ReceiptId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(tenant_id: TenantId, amount: Decimal, status: OrderStatus) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            tenant_id,
            vendor_id: ActorId::new(),
            buyer_id: ActorId::new(),
            amount,
            buyer_contact: "+15550001234".to_string(),
            status,
            notes: Vec::new(),
            receipt_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn dummy_paid(tenant_id: TenantId, amount: Decimal) -> Self {
        Self::dummy(tenant_id, amount, OrderStatus::Paid)
    }
}
