//! Redstone Courier Protocol engine
//!
//! Platform-agnostic core of the courier escape room: phase progression,
//! answer validation, the hint ledger, the activity log, deadline freeze, and
//! the terminal reveal. No DOM or browser APIs; hosts supply storage and time
//! through [`ProgressStorage`] and [`Clock`].

pub mod activity;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod hints;
pub mod phases;
pub mod progress;
pub mod reveal;
pub mod session;
pub mod storage;
pub mod tools;
pub mod validation;

pub use activity::{ActivityLog, LogCategory, LogEntry};
pub use checkpoint::{AnswerKind, CheckpointKey, MachineCheck, PhaseId, ShardId};
pub use clock::{Clock, Countdown, Deadline, ManualClock, Moment, SystemClock, Urgency};
pub use config::{AnswerKey, ConfigError, ProtocolConfig};
pub use error::{StorageError, SubmitError};
pub use events::{Observer, StateChange};
pub use hints::{HintTable, IssuedHint};
pub use phases::{CheckpointView, PHASES, PhaseSpec, PhaseState, PhaseView};
pub use progress::ProgressRecord;
pub use reveal::{RevealFrame, RevealSequence, RevealStage, RevealTimeline};
pub use session::ProtocolSession;
pub use storage::MemoryStorage;
pub use tools::{TOOLS, ToolId, ToolSpec};
pub use validation::{Answer, Rejection, Verdict};

/// Trait for abstracting progress persistence.
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is refused or the backend is unavailable.
    fn save_blob(&self, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Remove the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn clear(&self, key: &str) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-12-25T09:00:00-07:00")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn open() -> (ProtocolSession<MemoryStorage, ManualClock>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(start());
        let session = ProtocolSession::open(ProtocolConfig::default(), storage.clone(), clock.clone());
        (session, storage, clock)
    }

    #[test]
    fn session_persists_after_each_mutation() {
        let (mut session, storage, _) = open();
        assert!(storage.raw("rcp_state").is_none());
        session.authenticate("ezra", "RCP-2025-XMAS-COURIER").unwrap();
        let blob = storage.raw("rcp_state").unwrap();
        let stored = ProgressRecord::merge_over_defaults(&blob).unwrap();
        assert!(stored.authenticated);
        assert_eq!(stored.activity_log.latest().unwrap().message, "Session initialized");
        assert_eq!(stored.activity_log.latest().unwrap().time, "09:00");
    }

    #[test]
    fn observers_see_committed_changes() {
        let (mut session, _, _) = open();
        let seen: Rc<RefCell<Vec<StateChange>>> = Rc::default();
        let sink = Rc::clone(&seen);
        session.subscribe(Box::new(move |changes: &[StateChange], record: &ProgressRecord| {
            assert!(record.authenticated);
            sink.borrow_mut().extend_from_slice(changes);
        }));
        session.authenticate("Ezra", "RCP-2025-XMAS-COURIER").unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                StateChange::CheckpointVerified {
                    key: CheckpointKey::Login
                },
                StateChange::Authenticated,
            ]
        );
    }

    #[test]
    fn failed_writes_keep_memory_authoritative() {
        let (mut session, storage, _) = open();
        storage.set_fail_writes(true);
        session.authenticate("Ezra", "RCP-2025-XMAS-COURIER").unwrap();
        assert!(session.snapshot().authenticated);
        assert!(storage.raw("rcp_state").is_none());
        let verdict = session
            .submit_answer(CheckpointKey::Whitelist, &Answer::text("B"))
            .unwrap();
        assert!(verdict.is_accepted());
        assert_eq!(session.snapshot().current_phase, PhaseId::Origin);
    }

    #[test]
    fn countdown_and_urgency_use_the_injected_clock() {
        let (session, _, clock) = open();
        assert_eq!(session.urgency(), Urgency::Full);
        clock.advance(Duration::hours(45));
        assert_eq!(session.urgency(), Urgency::Critical);
        assert!(!session.countdown().expired);
    }
}
