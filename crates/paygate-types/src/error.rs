//! Error types for the paygate engine.
//!
//! All errors use the `PG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Receipt errors
//! - 3xx: Escalation errors
//! - 4xx: Credential (OTP) errors
//! - 5xx: Authorization errors
//! - 6xx: Validation errors
//! - 9xx: General / internal errors
//!
//! Every variant also maps onto the coarse [`ErrorKind`] taxonomy via
//! [`PaygateError::kind`], which is what transports should branch on.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    ActorRole, EscalationId, EscalationStatus, OrderId, OrderStatus, ReceiptId, ReceiptStatus,
    ReviewAction, TenantId,
};

/// The coarse error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    Validation,
    Credential,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Credential => write!(f, "CREDENTIAL"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Why an OTP verification failed.
///
/// Kept out of the display output on purpose: responses must not tell a
/// guesser whether the code was wrong, stale, or locked out. Tests and
/// in-process logs may still branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialFailure {
    /// No live code, or the submitted code did not match.
    Invalid,
    /// The code's TTL lapsed before verification.
    Expired,
    /// The subject is locked out after repeated failures.
    Locked,
}

/// Central error enum for all paygate operations.
#[derive(Debug, Error)]
pub enum PaygateError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order was not found.
    #[error("PG_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not an edge of the order state machine.
    #[error("PG_ERR_101: Illegal order transition {from} -> {to} for {order}")]
    InvalidTransition {
        order: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The order's status changed underneath a conditional write
    /// (optimistic guard: first writer wins).
    #[error("PG_ERR_102: Order {order} moved: expected {expected}, found {actual}")]
    OrderMoved {
        order: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// An order with this ID already exists.
    #[error("PG_ERR_103: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    // =================================================================
    // Receipt Errors (2xx)
    // =================================================================
    /// The requested receipt was not found.
    #[error("PG_ERR_200: Receipt not found: {0}")]
    ReceiptNotFound(ReceiptId),

    /// The receipt already transitioned away from PENDING_REVIEW.
    #[error("PG_ERR_201: Receipt {receipt} already resolved: {status}")]
    ReceiptAlreadyResolved {
        receipt: ReceiptId,
        status: ReceiptStatus,
    },

    /// The order already has a receipt attached (1:1 invariant).
    #[error("PG_ERR_202: Order {0} already has a receipt")]
    DuplicateReceipt(OrderId),

    // =================================================================
    // Escalation Errors (3xx)
    // =================================================================
    /// The requested escalation was not found.
    #[error("PG_ERR_300: Escalation not found: {0}")]
    EscalationNotFound(EscalationId),

    /// The escalation was already decided (or lapsed).
    #[error("PG_ERR_301: Escalation {escalation} already resolved: {status}")]
    EscalationAlreadyDecided {
        escalation: EscalationId,
        status: EscalationStatus,
    },

    /// The decision window lapsed before the decision arrived.
    #[error("PG_ERR_302: Escalation {0} expired before decision")]
    EscalationExpired(EscalationId),

    /// An escalation with this ID already exists.
    #[error("PG_ERR_303: Escalation already exists: {0}")]
    DuplicateEscalation(EscalationId),

    // =================================================================
    // Credential Errors (4xx)
    // =================================================================
    /// OTP verification failed. The message deliberately omits whether the
    /// code was invalid, expired, or locked out.
    #[error("PG_ERR_400: Credential verification failed")]
    Credential { reason: CredentialFailure },

    // =================================================================
    // Authorization Errors (5xx)
    // =================================================================
    /// The actor's tenant does not own the resource.
    #[error("PG_ERR_500: Unauthorized: actor tenant {actor_tenant} cannot access resource of {resource_tenant}")]
    CrossTenant {
        actor_tenant: TenantId,
        resource_tenant: TenantId,
    },

    /// The actor is in the right tenant but is not the party this action
    /// belongs to (e.g. a vendor reviewing another vendor's receipt).
    #[error("PG_ERR_501: Unauthorized: actor is not the owner of this resource")]
    NotResourceOwner,

    /// The actor's role does not permit this action.
    #[error("PG_ERR_502: Unauthorized: requires role {required}, actor is {actual}")]
    RoleNotPermitted {
        required: ActorRole,
        actual: ActorRole,
    },

    // =================================================================
    // Validation Errors (6xx)
    // =================================================================
    /// Notes are mandatory for this review action.
    #[error("PG_ERR_600: Notes are required for action {0}")]
    MissingNotes(ReviewAction),

    /// The amount is malformed (zero or negative).
    #[error("PG_ERR_601: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error (store fault, broken invariant).
    #[error("PG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// I/O error from the record store backend.
    #[error("PG_ERR_901: I/O error: {0}")]
    Io(String),
}

impl PaygateError {
    /// Map this error onto the coarse taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OrderNotFound(_) | Self::ReceiptNotFound(_) | Self::EscalationNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::CrossTenant { .. } | Self::NotResourceOwner | Self::RoleNotPermitted { .. } => {
                ErrorKind::Unauthorized
            }
            Self::InvalidTransition { .. }
            | Self::OrderMoved { .. }
            | Self::DuplicateOrder(_)
            | Self::ReceiptAlreadyResolved { .. }
            | Self::DuplicateReceipt(_)
            | Self::EscalationAlreadyDecided { .. }
            | Self::EscalationExpired(_)
            | Self::DuplicateEscalation(_) => ErrorKind::InvalidState,
            Self::MissingNotes(_) | Self::InvalidAmount(_) => ErrorKind::Validation,
            Self::Credential { .. } => ErrorKind::Credential,
            Self::Internal(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PaygateError>;

// Conversion from std::io::Error
impl From<std::io::Error> for PaygateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
