//! # paygate-types
//!
//! Shared types, errors, and configuration for the **paygate**
//! receipt-verification engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`TenantId`], [`ActorId`], [`OrderId`], [`ReceiptId`], [`EscalationId`]
//! - **Actors**: [`ActorRole`], [`ActorContext`]
//! - **Order model**: [`Order`], [`OrderStatus`]
//! - **Receipt model**: [`Receipt`], [`ReceiptStatus`], [`ReviewAction`]
//! - **Escalation model**: [`Escalation`], [`EscalationStatus`], [`EscalationReason`], [`Decision`]
//! - **OTP model**: [`OtpRecord`]
//! - **Configuration**: [`PaygateConfig`], [`PolicyConfig`], [`OtpConfig`], [`EscalationConfig`]
//! - **Errors**: [`PaygateError`] with `PG_ERR_` prefix codes and an [`ErrorKind`] taxonomy
//! - **Constants**: system-wide limits and defaults

pub mod actor;
pub mod config;
pub mod constants;
pub mod error;
pub mod escalation;
pub mod ids;
pub mod order;
pub mod otp;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use paygate_types::{Order, OrderStatus, Escalation, ...};

pub use actor::*;
pub use config::*;
pub use error::*;
pub use escalation::*;
pub use ids::*;
pub use order::*;
pub use otp::*;
pub use receipt::*;

// Constants are accessed via `paygate_types::constants::FOO`
// (not re-exported to avoid name collisions).
