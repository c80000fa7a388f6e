//! Receipt types: proof-of-payment metadata awaiting vendor review.
//!
//! The binary artifact (the receipt image) lives in external object
//! storage; this core only carries its metadata. OCR output is attached at
//! upload time as an opaque value — stored and forwarded for human review,
//! never interpreted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, OrderId, ReceiptId, TenantId};

/// Review status of a receipt.
///
/// A receipt transitions exactly once away from `PENDING_REVIEW`;
/// reprocessing a resolved receipt is an invalid-state error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Uploaded and awaiting the vendor's decision.
    PendingReview,
    /// The vendor accepted the payment as observed.
    Approved,
    /// The vendor rejected the receipt.
    Rejected,
    /// Escalated to the CEO (auto-escalation policy or explicit flag).
    Flagged,
}

impl ReceiptStatus {
    /// Can a receipt in this status transition to the given target status?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::PendingReview,
                Self::Approved | Self::Rejected | Self::Flagged
            )
        )
    }

    /// A resolved receipt is immutable.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        *self != Self::PendingReview
    }
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingReview => write!(f, "PENDING_REVIEW"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Flagged => write!(f, "FLAGGED"),
        }
    }
}

/// The reviewer's verdict on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewAction {
    /// Payment looks good.
    Approve,
    /// Payment was not observed; void the order.
    Reject,
    /// Explicit distrust signal. Always escalates, regardless of amount.
    Flag,
}

impl std::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "APPROVE"),
            Self::Reject => write!(f, "REJECT"),
            Self::Flag => write!(f, "FLAG"),
        }
    }
}

/// Proof-of-payment metadata for exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub tenant_id: TenantId,
    /// The order this receipt proves payment for (1:1).
    pub order_id: OrderId,
    pub buyer_id: ActorId,
    /// The vendor expected to review this receipt.
    pub reviewer_id: ActorId,
    pub status: ReceiptStatus,
    pub reviewer_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Opaque extracted-field/confidence metadata from the OCR service.
    pub ocr_metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Receipt {
    pub fn dummy_pending(
        tenant_id: TenantId,
        order_id: OrderId,
        buyer_id: ActorId,
        reviewer_id: ActorId,
    ) -> Self {
        Self {
            id: ReceiptId::new(),
            tenant_id,
            order_id,
            buyer_id,
            reviewer_id,
            status: ReceiptStatus::PendingReview,
            reviewer_notes: None,
            reviewed_at: None,
            ocr_metadata: serde_json::json!({ "confidence": 0.91 }),
            created_at: Utc::now(),
        }
    }
}
