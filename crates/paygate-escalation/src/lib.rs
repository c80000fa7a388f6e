//! # paygate-escalation
//!
//! **Decision Plane**: the OTP-gated human sign-off on orders the
//! auto-escalation policy refused to resolve.
//!
//! ## Decision Flow
//!
//! ```text
//! request_decision_code() ──▶ OtpLedger.issue()      (code out-of-band)
//! decide(code, verdict)   ──▶ OtpLedger.verify()     (consumes the code)
//!                          ──▶ escalation PENDING → APPROVED/REJECTED
//!                          ──▶ order ESCALATED → APPROVED/REJECTED
//!                          ──▶ notifications (best-effort)
//! ```
//!
//! The OTP record is deleted on first successful verification, so a
//! replayed code dies at step one — before any state is touched.
//! Raw buyer contact details never leave this crate unmasked.

pub mod manager;
pub mod masking;
pub mod otp;

pub use manager::{DecisionOutcome, EscalationDetail, EscalationManager, EscalationSummary};
pub use masking::mask_contact;
pub use otp::OtpLedger;
