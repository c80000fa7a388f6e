//! System-wide constants for the paygate engine.

/// Default high-value threshold, in minor units of the tenant currency.
/// Orders at or above this amount always require a CEO decision.
pub const DEFAULT_HIGH_VALUE_THRESHOLD: i64 = 1_000_000;

/// Default OTP time-to-live in seconds.
pub const DEFAULT_OTP_TTL_SECS: i64 = 300;

/// Length of a generated OTP code.
pub const OTP_CODE_LEN: usize = 8;

/// Alphabet for generated OTP codes. Ambiguous glyphs (0/O, 1/I/L)
/// are excluded because codes are relayed over chat and read aloud.
pub const OTP_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Consecutive failed verifications before the subject locks.
pub const DEFAULT_OTP_MAX_FAILURES: u32 = 5;

/// Lockout duration in seconds after too many failures.
pub const DEFAULT_OTP_LOCKOUT_SECS: i64 = 900;

/// Default escalation decision window in hours.
pub const DEFAULT_ESCALATION_TTL_HOURS: i64 = 48;

/// Number of trailing characters left visible when masking buyer contact.
pub const CONTACT_MASK_SUFFIX_LEN: usize = 4;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "paygate";
