//! Centralized tuning constants for the courier protocol engine.
//!
//! Timings, caps, and participant-facing log strings live here so that the
//! behaviour of a deployment can only change through reviewed code, not
//! through the persisted blob.

// Activity log -------------------------------------------------------------
pub(crate) const ACTIVITY_LOG_CAP: usize = 12;
pub(crate) const LOG_SESSION_INITIALIZED: &str = "Session initialized";
pub(crate) const LOG_WINDOW_CLOSED: &str = "AUTHORIZATION WINDOW CLOSED";
pub(crate) const LOG_DECRYPT_STARTED: &str = "Decryption sequence initiated";
pub(crate) const LOG_DECRYPT_COMPLETE: &str = "COURIER PATH DECRYPTED";
pub(crate) const LOG_TOOL_UNLOCKED_PREFIX: &str = "Tool unlocked: ";
pub(crate) const LOG_TIME_FORMAT: &str = "%H:%M";

// Storage ------------------------------------------------------------------
pub(crate) const STORAGE_KEY_SUFFIX: &str = "state";

// Phase graph --------------------------------------------------------------
pub(crate) const MIN_PHASE: u8 = 1;
pub(crate) const MAX_PHASE: u8 = 6;

// Deadline urgency ---------------------------------------------------------
pub(crate) const URGENCY_FULL_HOURS: i64 = 48;
pub(crate) const URGENCY_WARNING_HOURS: i64 = 12;
pub(crate) const MILLIS_PER_SECOND: i64 = 1_000;
pub(crate) const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub(crate) const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub(crate) const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

// Reveal sequence ----------------------------------------------------------
pub(crate) const REVEAL_LEAD_IN_MS: u64 = 1_000;
pub(crate) const REVEAL_STEPS: [(&str, u64); 4] = [
    ("Initializing decryptor...", 800),
    ("Verifying shard integrity...", 1_200),
    ("Reconstructing payload ID...", 1_000),
    ("Decrypting transmission...", 800),
];
pub(crate) const REVEAL_SWEEP_TICK_MS: u64 = 50;
pub(crate) const REVEAL_SWEEP_STEP_PCT: u8 = 2;
pub(crate) const REVEAL_CHAR_INTERVAL_MS: u64 = 200;
pub(crate) const REVEAL_SETTLE_MS: u64 = 500;
pub(crate) const SCRAMBLE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
