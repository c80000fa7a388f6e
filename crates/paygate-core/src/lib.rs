//! # paygate-core
//!
//! Shared kernel of the paygate engine:
//!
//! 1. **Tenancy Guard**: the single authorization chokepoint every
//!    component calls before touching a resource
//! 2. **`OrderLifecycle`**: the sole writer of order status, with an
//!    expected-current-status guard against lost updates
//! 3. **`Notifier`**: the seam to the external notification dispatcher
//!    (fire-and-forget; failures never roll back a committed decision)
//!
//! ## Write discipline
//!
//! ```text
//! verify / escalation components ──▶ OrderLifecycle.transition() ──▶ store
//! ```
//!
//! No component other than [`OrderLifecycle`] may persist an order status.

pub mod lifecycle;
pub mod notify;
pub mod tenancy;

pub use lifecycle::OrderLifecycle;
pub use notify::Notifier;
pub use tenancy::authorize;
