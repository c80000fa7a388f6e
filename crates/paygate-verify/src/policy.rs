//! Auto-escalation policy — the rule forcing human review.
//!
//! `requires_escalation = amount >= high_value_threshold OR action == Flag`.
//!
//! Pure and side-effect free; the engine evaluates it before committing
//! anything.

use rust_decimal::Decimal;

use paygate_types::{EscalationReason, ReviewAction};

/// Decide whether a review outcome must be escalated to the CEO, and why.
///
/// Returns `None` when the reviewer's decision may auto-resolve. An
/// explicit `Flag` outranks the numeric rule: a flagged high-value order
/// records `FlaggedByVendor`, because the human signal is the one the CEO
/// needs to see.
#[must_use]
pub fn requires_escalation(
    amount: Decimal,
    action: ReviewAction,
    high_value_threshold: Decimal,
) -> Option<EscalationReason> {
    if action == ReviewAction::Flag {
        return Some(EscalationReason::FlaggedByVendor);
    }
    if amount >= high_value_threshold {
        return Some(EscalationReason::HighValue);
    }
    None
}
