//! Configuration types for the paygate engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaygateConfig {
    /// Auto-escalation policy settings.
    pub policy: PolicyConfig,
    /// OTP ledger settings.
    pub otp: OtpConfig,
    /// Escalation lifecycle settings.
    pub escalation: EscalationConfig,
}

/// Auto-escalation policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Orders at or above this amount always require a CEO decision,
    /// whatever the reviewer decided.
    pub high_value_threshold: Decimal,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: Decimal::from(constants::DEFAULT_HIGH_VALUE_THRESHOLD),
        }
    }
}

/// OTP ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Code time-to-live in seconds.
    pub ttl_secs: i64,
    /// Consecutive failed verifications before the subject locks.
    pub max_failures: u32,
    /// Lockout duration in seconds once the failure threshold is hit.
    pub lockout_secs: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: constants::DEFAULT_OTP_TTL_SECS,
            max_failures: constants::DEFAULT_OTP_MAX_FAILURES,
            lockout_secs: constants::DEFAULT_OTP_LOCKOUT_SECS,
        }
    }
}

/// Escalation lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Hard decision window in hours; past it an escalation lapses.
    pub ttl_hours: i64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            ttl_hours: constants::DEFAULT_ESCALATION_TTL_HOURS,
        }
    }
}
