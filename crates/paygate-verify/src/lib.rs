//! # paygate-verify
//!
//! **Receipt Verification Plane**: vendor review of uploaded payment
//! receipts, and the auto-escalation policy deciding which orders a
//! human must sign off on.
//!
//! ## Review Flow
//!
//! ```text
//! upload (external) → record_upload() → verify_receipt()
//!     ├─ policy fires → order ESCALATED, receipt FLAGGED, escalation PENDING
//!     └─ otherwise    → order VERIFIED/CANCELLED, receipt APPROVED/REJECTED,
//!                       buyer notified (best-effort)
//! ```
//!
//! The policy is evaluated **before any commit**, against the order's
//! recorded amount — never a buyer-submitted figure. An explicit `Flag`
//! always escalates, whatever the amount: it is a distrust signal that
//! must never auto-resolve.

pub mod engine;
pub mod policy;

pub use engine::{ReviewOutcome, VerificationEngine};
pub use policy::requires_escalation;
