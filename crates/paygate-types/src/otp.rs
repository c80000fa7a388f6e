//! OTP record: a short-lived credential proving deliberate presence at
//! decision time.
//!
//! Only the SHA-256 hash of the code is ever stored. The record is deleted
//! on first successful verification — single use is enforced by deletion,
//! not by a flag — and repeated failures lock the subject independently of
//! the code's TTL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, ActorRole};

/// A live one-time-passcode record for one (subject, role) pair.
///
/// At most one of these exists per (subject, role) at any time; issuing a
/// new code overwrites the previous record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    pub subject: ActorId,
    pub role: ActorRole,
    /// SHA-256 over the domain-separated code payload. The plaintext code
    /// is never stored.
    pub code_hash: [u8; 32],
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Consecutive failed verification attempts against this record.
    pub failed_attempts: u32,
    /// While set and in the future, all verification is refused.
    pub locked_until: Option<DateTime<Utc>>,
}

impl OtpRecord {
    /// Whether the code's natural TTL has lapsed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the subject is locked out, independent of the TTL.
    #[must_use]
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}
