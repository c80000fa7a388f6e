//! # paygate-store
//!
//! The durable record store abstraction for the paygate engine.
//!
//! The store is the only shared mutable resource in the system. It is
//! deliberately small: key-addressed reads, duplicate-rejecting puts,
//! conditional updates guarded by an expected value, and tenant-scoped
//! range queries. Everything the engine needs, nothing tied to a storage
//! technology.
//!
//! ## Conditional writes instead of coarse locks
//!
//! Decision-affecting writes (receipt outcome, escalation decision, order
//! transition) are linearized per record via the `expected` argument of
//! each `update_*` method: if the record moved underneath the caller, the
//! write is rejected and the caller observes a first-writer-wins conflict.
//! Unrelated records never contend.
//!
//! ## OTP primitives
//!
//! The per-(subject, role) OTP record gets two special operations:
//! `put_otp` always wins by overwrite, and [`RecordStore::delete_otp_if`]
//! is a single atomic read-compare-delete — the primitive that makes a
//! one-time code one-time. The hash comparison inside it must be constant
//! time; backends share [`constant_time_eq`].

pub mod memory;

use async_trait::async_trait;

use paygate_types::{
    ActorId, ActorRole, Escalation, EscalationId, EscalationStatus, Order, OrderId, OrderStatus,
    OtpRecord, Receipt, ReceiptId, ReceiptStatus, Result, TenantId,
};

pub use memory::MemoryStore;

/// Compare two digests without early exit, so timing reveals nothing
/// about the position of the first differing byte.
#[must_use]
pub fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The record store interface.
///
/// Implementations must be safe for concurrent use and must not hold any
/// exclusive lock across I/O awaits.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ==================== Orders ====================

    /// Insert a new order. Rejects an already-used ID.
    async fn put_order(&self, order: &Order) -> Result<()>;

    /// Fetch an order by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Replace an order, guarded by its expected current status.
    ///
    /// # Errors
    /// - `OrderNotFound` if the order does not exist
    /// - `OrderMoved` if the stored status differs from `expected`
    /// - `Internal` if the write attempts to change the tenant id
    async fn update_order(&self, order: &Order, expected: OrderStatus) -> Result<()>;

    // ==================== Receipts ====================

    /// Insert a new receipt. Rejects an already-used ID.
    async fn put_receipt(&self, receipt: &Receipt) -> Result<()>;

    /// Fetch a receipt by ID.
    async fn get_receipt(&self, id: ReceiptId) -> Result<Option<Receipt>>;

    /// Replace a receipt, guarded by its expected current status.
    ///
    /// # Errors
    /// - `ReceiptNotFound` if the receipt does not exist
    /// - `ReceiptAlreadyResolved` if the stored status differs from `expected`
    async fn update_receipt(&self, receipt: &Receipt, expected: ReceiptStatus) -> Result<()>;

    // ==================== Escalations ====================

    /// Insert a new escalation. Rejects an already-used ID.
    async fn put_escalation(&self, escalation: &Escalation) -> Result<()>;

    /// Fetch an escalation by ID.
    async fn get_escalation(&self, id: EscalationId) -> Result<Option<Escalation>>;

    /// Replace an escalation, guarded by its expected current status.
    ///
    /// # Errors
    /// - `EscalationNotFound` if the escalation does not exist
    /// - `EscalationAlreadyDecided` if the stored status differs from `expected`
    async fn update_escalation(
        &self,
        escalation: &Escalation,
        expected: EscalationStatus,
    ) -> Result<()>;

    /// All escalations belonging to one tenant, in creation order.
    async fn list_escalations(&self, tenant: TenantId) -> Result<Vec<Escalation>>;

    // ==================== OTP records ====================

    /// Store an OTP record, overwriting any previous record for the same
    /// (subject, role). At most one live code per pair.
    async fn put_otp(&self, record: &OtpRecord) -> Result<()>;

    /// Fetch the live OTP record for a (subject, role), if any.
    async fn get_otp(&self, subject: ActorId, role: ActorRole) -> Result<Option<OtpRecord>>;

    /// Replace an OTP record only while its stored hash still equals
    /// `expected_hash`. Returns `false` (not an error) when the record is
    /// gone or was re-issued meanwhile — the caller's bookkeeping simply
    /// no longer applies.
    async fn update_otp(&self, record: &OtpRecord, expected_hash: &[u8; 32]) -> Result<bool>;

    /// Remove an OTP record unconditionally (natural expiry cleanup).
    async fn delete_otp(&self, subject: ActorId, role: ActorRole) -> Result<()>;

    /// Atomic read-compare-delete: removes the record and returns `true`
    /// iff its stored hash equals `expected_hash` (compared in constant
    /// time). This is the single-use guarantee — two concurrent calls can
    /// never both observe `true` for one code.
    async fn delete_otp_if(
        &self,
        subject: ActorId,
        role: ActorRole,
        expected_hash: &[u8; 32],
    ) -> Result<bool>;
}
