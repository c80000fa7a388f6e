//! OTP ledger — issues, verifies, and single-use-invalidates the codes
//! gating CEO decisions.
//!
//! Only the SHA-256 hash of a code is stored, domain-separated and bound
//! to the (subject, role) it was issued for. Verification consumes the
//! record through the store's atomic read-compare-delete, which is what
//! makes a one-time code one-time: there is no window in which two
//! concurrent verifications can both succeed.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use paygate_store::RecordStore;
use paygate_types::{
    ActorId, ActorRole, CredentialFailure, OtpConfig, OtpRecord, PaygateError, Result, constants,
};

/// Issues and verifies one-time passcodes.
pub struct OtpLedger<S> {
    store: Arc<S>,
    config: OtpConfig,
}

impl<S: RecordStore> OtpLedger<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: OtpConfig) -> Self {
        Self { store, config }
    }

    /// Domain-separated hash binding the code to its (subject, role).
    ///
    /// A code lifted from one subject hashes differently under another,
    /// so it can never match another subject's record.
    fn hash_code(subject: ActorId, role: ActorRole, code: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"paygate:otp:v1:");
        hasher.update(subject.0.as_bytes());
        hasher.update([role_tag(role)]);
        hasher.update(b":");
        hasher.update(code.as_bytes());
        hasher.finalize().into()
    }

    /// High-entropy code over an alphabet without ambiguous glyphs.
    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..constants::OTP_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..constants::OTP_CODE_ALPHABET.len());
                constants::OTP_CODE_ALPHABET[idx] as char
            })
            .collect()
    }

    /// Issue a fresh code for (subject, role), overwriting any previous
    /// live code — at most one outstanding code per pair.
    ///
    /// The plaintext code is returned to the caller for out-of-band
    /// delivery and never stored.
    ///
    /// # Errors
    /// `Credential` if the subject is currently locked out: a live lock
    /// cannot be reset by re-issuing.
    pub async fn issue(
        &self,
        subject: ActorId,
        role: ActorRole,
        ttl: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        if let Some(existing) = self.store.get_otp(subject, role).await? {
            if existing.is_locked_at(now) {
                return Err(PaygateError::Credential {
                    reason: CredentialFailure::Locked,
                });
            }
        }

        let code = Self::generate_code();
        let record = OtpRecord {
            subject,
            role,
            code_hash: Self::hash_code(subject, role, &code),
            created_at: now,
            expires_at: now + ttl,
            failed_attempts: 0,
            locked_until: None,
        };
        self.store.put_otp(&record).await?;

        tracing::info!(
            subject = %subject,
            role = %role,
            hash_prefix = %hex::encode(&record.code_hash[..4]),
            ttl_secs = ttl.num_seconds(),
            "OTP issued"
        );
        Ok(code)
    }

    /// Verify a submitted code for (subject, role).
    ///
    /// On success the record is already deleted when this returns —
    /// single use is enforced by deletion, so any replay fails here.
    /// On mismatch the failure counter is bumped and the subject locks
    /// past the threshold, independent of the code's TTL.
    ///
    /// # Errors
    /// `Credential` on every failure. The display output does not say
    /// whether the code was invalid, expired, or locked out; the typed
    /// reason stays available in-process.
    pub async fn verify(&self, subject: ActorId, role: ActorRole, submitted: &str) -> Result<()> {
        let now = Utc::now();
        let Some(record) = self.store.get_otp(subject, role).await? else {
            return Err(PaygateError::Credential {
                reason: CredentialFailure::Invalid,
            });
        };

        // Lock first: it outlives the code's own TTL.
        if record.is_locked_at(now) {
            return Err(PaygateError::Credential {
                reason: CredentialFailure::Locked,
            });
        }
        if record.is_expired_at(now) {
            self.store.delete_otp(subject, role).await?;
            return Err(PaygateError::Credential {
                reason: CredentialFailure::Expired,
            });
        }

        let submitted_hash = Self::hash_code(subject, role, submitted);
        if self
            .store
            .delete_otp_if(subject, role, &submitted_hash)
            .await?
        {
            tracing::info!(subject = %subject, role = %role, "OTP verified and consumed");
            return Ok(());
        }

        // Mismatch. Bump the counter on the record we read; the
        // expected-hash guard keeps a concurrent re-issue from being
        // clobbered by this bookkeeping write.
        let mut updated = record.clone();
        updated.failed_attempts += 1;
        if updated.failed_attempts >= self.config.max_failures {
            updated.locked_until = Some(now + Duration::seconds(self.config.lockout_secs));
            tracing::warn!(
                subject = %subject,
                attempts = updated.failed_attempts,
                lockout_secs = self.config.lockout_secs,
                "OTP subject locked after repeated failures"
            );
        }
        self.store.update_otp(&updated, &record.code_hash).await?;

        Err(PaygateError::Credential {
            reason: CredentialFailure::Invalid,
        })
    }
}

/// Stable one-byte tag per role for the hash payload.
fn role_tag(role: ActorRole) -> u8 {
    match role {
        ActorRole::Vendor => 0x01,
        ActorRole::Buyer => 0x02,
        ActorRole::Ceo => 0x03,
    }
}
