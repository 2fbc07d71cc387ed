use chrono::{DateTime, Utc};

use crate::ProgressStorage;
use crate::activity::LogCategory;
use crate::checkpoint::{CheckpointKey, PhaseId, ShardId};
use crate::clock::{Clock, Countdown, Deadline, Moment, Urgency};
use crate::config::ProtocolConfig;
use crate::constants::{
    LOG_DECRYPT_COMPLETE, LOG_DECRYPT_STARTED, LOG_SESSION_INITIALIZED, LOG_WINDOW_CLOSED,
};
use crate::error::SubmitError;
use crate::events::{Observer, StateChange};
use crate::hints::{HintTable, IssuedHint, issue_hint};
use crate::phases::{
    PhaseState, PhaseView, checkpoint_unlocked, checkpoint_verified, complete_phase, phase_state,
    view_phase,
};
use crate::progress::ProgressRecord;
use crate::reveal::{RevealFrame, RevealSequence};
use crate::tools::apply_tool_gate;
use crate::validation::{Answer, Verdict, validate};

#[derive(Debug)]
struct ActiveReveal {
    sequence: RevealSequence,
    announced: bool,
}

/// One participant's run through the protocol.
///
/// Owns the progress record and is the only thing that mutates it. Every
/// handler runs read-modify-persist to completion, then notifies observers.
pub struct ProtocolSession<S, C> {
    config: ProtocolConfig,
    hints: HintTable,
    deadline: Deadline,
    storage: S,
    clock: C,
    record: ProgressRecord,
    frozen: bool,
    reveal: Option<ActiveReveal>,
    reveal_seed: u64,
    observers: Vec<Observer>,
}

impl<S, C> ProtocolSession<S, C>
where
    S: ProgressStorage,
    C: Clock,
{
    /// Load (or create) the progress record and reconcile derived state.
    ///
    /// Storage faults and malformed blobs fall back to defaults; opening a
    /// session never fails.
    pub fn open(config: ProtocolConfig, storage: S, clock: C) -> Self {
        let record = load_record(&storage, &config.storage_key());
        let reveal_seed = u64::try_from(clock.now().timestamp_millis()).unwrap_or_default();
        let mut session = Self {
            hints: HintTable::from_config(&config),
            deadline: Deadline::new(config.deadline),
            config,
            storage,
            clock,
            record,
            frozen: false,
            reveal: None,
            reveal_seed,
            observers: Vec::new(),
        };
        let at = session.moment();
        let reconciled = apply_tool_gate(&mut session.record, &at);
        session.commit(reconciled);
        session
    }

    /// Fix the scramble seed used by the next reveal sequence.
    #[must_use]
    pub fn with_reveal_seed(mut self, seed: u64) -> Self {
        self.reveal_seed = seed;
        self
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    #[must_use]
    pub const fn snapshot(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub const fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    #[must_use]
    pub const fn hints(&self) -> &HintTable {
        &self.hints
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// True once the deadline has passed, whether or not `tick` has
    /// announced it yet.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen || self.deadline.is_expired(self.clock.now())
    }

    #[must_use]
    pub fn phase_state(&self, phase: PhaseId) -> PhaseState {
        phase_state(&self.record, phase)
    }

    #[must_use]
    pub fn view_phase(&self, phase: PhaseId) -> Option<PhaseView> {
        view_phase(&self.record, &self.hints, phase, self.is_frozen())
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.deadline.remaining(self.clock.now())
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.deadline.urgency(self.clock.now())
    }

    /// The secret value, available only once the reveal has completed.
    #[must_use]
    pub fn tracking_number(&self) -> Option<&str> {
        self.record
            .final_sequence_revealed
            .then_some(self.config.tracking_number.as_str())
    }

    /// Check credentials and open the protocol.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::BlankInput`] if either field is blank.
    pub fn authenticate(&mut self, operator: &str, session_key: &str) -> Result<Verdict, SubmitError> {
        self.submit_answer(CheckpointKey::Login, &Answer::credentials(operator, session_key))
    }

    /// Judge an answer and apply the resulting transition.
    ///
    /// A rejection advances that checkpoint's hint tier by one; an acceptance
    /// records the checkpoint and completes its phase when the phase is done.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] when the checkpoint cannot currently take a
    /// submission or the answer is blank or has the wrong shape. No state
    /// changes in that case.
    pub fn submit_answer(&mut self, key: CheckpointKey, answer: &Answer) -> Result<Verdict, SubmitError> {
        self.ensure_submittable(key)?;
        let verdict = validate(&self.config, key, answer)?;
        let at = self.moment();
        let changes = match verdict {
            Verdict::Rejected(rejection) => {
                log::debug!("{key} rejected: {rejection:?}");
                if self.is_frozen() {
                    Vec::new()
                } else {
                    issue_hint(&mut self.record, &self.hints, key, &at)
                        .map(|(_, change)| change)
                        .into_iter()
                        .collect()
                }
            }
            Verdict::Accepted => self.accept(key, answer, &at),
        };
        self.commit(changes);
        Ok(verdict)
    }

    /// Unlock the next hint tier for `key`.
    ///
    /// Returns `None` without touching the record when the ladder is
    /// exhausted, the checkpoint is not open for work, or the session is frozen.
    pub fn request_hint(&mut self, key: CheckpointKey) -> Option<IssuedHint> {
        if self.is_frozen() || self.ensure_open(key).is_err() {
            return None;
        }
        let at = self.moment();
        let (hint, change) = issue_hint(&mut self.record, &self.hints, key, &at)?;
        self.commit(vec![change]);
        Some(hint)
    }

    /// Replace the record with defaults when `credential` matches the session key.
    pub fn reset_progress(&mut self, credential: &str) -> bool {
        if !self.config.admin_reset_enabled {
            log::warn!("progress reset refused: admin reset disabled");
            return false;
        }
        if credential.trim() != self.config.session_key {
            log::warn!("progress reset refused: credential mismatch");
            return false;
        }
        let key = self.config.storage_key();
        if let Err(err) = self.storage.clear(&key) {
            log::warn!("failed to clear stored progress under {key}: {err}");
        }
        self.record = ProgressRecord::default();
        self.reveal = None;
        self.commit(vec![StateChange::Reset]);
        true
    }

    /// Periodic heartbeat: enter frozen mode on the first expired tick and
    /// drive any running reveal.
    pub fn tick(&mut self) -> Vec<StateChange> {
        let mut changes = Vec::new();
        if !self.frozen && self.deadline.is_expired(self.clock.now()) {
            self.frozen = true;
            let at = self.moment();
            self.record.log(&at, LOG_WINDOW_CLOSED, LogCategory::Warning);
            log::debug!("deadline passed; protocol frozen");
            changes.push(StateChange::Frozen);
            self.commit(changes.clone());
        }
        if let Some((_, reveal_changes)) = self.step_reveal() {
            changes.extend(reveal_changes);
        }
        changes
    }

    /// Current reveal frame, applying start and completion side effects as the
    /// timeline passes them. `None` when no reveal is running.
    pub fn reveal_frame(&mut self) -> Option<RevealFrame> {
        self.step_reveal().map(|(frame, _)| frame)
    }

    #[must_use]
    pub fn reveal_armed_at(&self) -> Option<DateTime<Utc>> {
        self.reveal.as_ref().map(|active| active.sequence.armed_at())
    }

    fn step_reveal(&mut self) -> Option<(RevealFrame, Vec<StateChange>)> {
        let now = self.clock.now();
        let at = self.moment();
        let active = self.reveal.as_mut()?;
        let mut changes = Vec::new();
        if !active.announced && active.sequence.has_started(now) {
            active.announced = true;
            self.record.log(&at, LOG_DECRYPT_STARTED, LogCategory::System);
            changes.push(StateChange::RevealStarted);
        }
        let frame = active.sequence.frame(now);
        if frame.is_complete() && !self.record.final_sequence_revealed {
            self.record.final_sequence_revealed = true;
            self.record.log(&at, LOG_DECRYPT_COMPLETE, LogCategory::Success);
            changes.push(StateChange::RevealCompleted);
        }
        if frame.is_complete() {
            self.reveal = None;
        }
        if !changes.is_empty() {
            self.commit(changes.clone());
        }
        Some((frame, changes))
    }

    fn moment(&self) -> Moment {
        Moment::new(self.clock.now(), self.deadline.offset())
    }

    fn ensure_open(&self, key: CheckpointKey) -> Result<(), SubmitError> {
        let Some(phase) = key.phase() else {
            return if self.record.authenticated {
                Err(SubmitError::AlreadyVerified(key))
            } else {
                Ok(())
            };
        };
        if !self.record.authenticated {
            return Err(SubmitError::NotAuthenticated);
        }
        match phase_state(&self.record, phase) {
            PhaseState::Locked => return Err(SubmitError::PhaseLocked(phase)),
            PhaseState::Completed => return Err(SubmitError::PhaseCompleted(phase)),
            PhaseState::Active => {}
        }
        if !checkpoint_unlocked(&self.record, key) {
            return Err(SubmitError::CheckpointLocked(key));
        }
        if checkpoint_verified(&self.record, key) {
            return Err(SubmitError::AlreadyVerified(key));
        }
        Ok(())
    }

    fn ensure_submittable(&self, key: CheckpointKey) -> Result<(), SubmitError> {
        if self.is_frozen() && key != CheckpointKey::Login {
            return Err(SubmitError::Frozen);
        }
        self.ensure_open(key)
    }

    fn accept(&mut self, key: CheckpointKey, answer: &Answer, at: &Moment) -> Vec<StateChange> {
        let mut changes = vec![StateChange::CheckpointVerified { key }];
        let record = &mut self.record;
        match key {
            CheckpointKey::Login => {
                record.authenticated = true;
                record.log(at, LOG_SESSION_INITIALIZED, LogCategory::System);
                changes.push(StateChange::Authenticated);
            }
            CheckpointKey::Whitelist | CheckpointKey::Origin | CheckpointKey::Binding => {
                if let Some(phase) = key.phase() {
                    changes.extend(complete_phase(record, phase, at));
                }
            }
            CheckpointKey::Machine(check) => {
                record.sub_checkpoints.insert(key, true);
                record.log(
                    at,
                    format!("Checkpoint 3{} verified", check.as_str()),
                    LogCategory::Success,
                );
                if record.all_machine_checks_verified() {
                    changes.extend(complete_phase(record, PhaseId::MachineLanguage, at));
                }
            }
            CheckpointKey::Shard(shard) => {
                record.sub_checkpoints.insert(key, true);
                if let Answer::Text { value } = answer {
                    record
                        .decoded_shard_values
                        .entry(shard)
                        .or_insert_with(|| value.trim().to_string());
                }
                record.log(at, format!("Shard {shard} verified"), LogCategory::Success);
                if shard == ShardId::C {
                    changes.extend(complete_phase(record, PhaseId::ThreeShards, at));
                }
            }
            CheckpointKey::FinalAssembly => {
                changes.extend(complete_phase(record, PhaseId::CourierVision, at));
                if !record.final_sequence_revealed {
                    self.reveal = Some(ActiveReveal {
                        sequence: RevealSequence::new(
                            &self.config.tracking_number,
                            at.at,
                            self.reveal_seed,
                        ),
                        announced: false,
                    });
                }
            }
        }
        changes
    }

    /// Persist, then notify. A failed write is logged and otherwise ignored;
    /// the in-memory record stays authoritative.
    fn commit(&mut self, changes: Vec<StateChange>) {
        if changes.is_empty() {
            return;
        }
        let key = self.config.storage_key();
        match self.record.to_blob() {
            Ok(blob) => {
                if let Err(err) = self.storage.save_blob(&key, &blob) {
                    log::warn!("failed to persist progress under {key}: {err}");
                }
            }
            Err(err) => log::warn!("failed to serialize progress: {err}"),
        }
        for observer in &mut self.observers {
            observer(&changes, &self.record);
        }
    }
}

fn load_record<S: ProgressStorage>(storage: &S, key: &str) -> ProgressRecord {
    match storage.load_blob(key) {
        Ok(Some(blob)) => ProgressRecord::merge_over_defaults(&blob).unwrap_or_else(|err| {
            log::warn!("discarding malformed progress blob under {key}: {err}");
            ProgressRecord::default()
        }),
        Ok(None) => ProgressRecord::default(),
        Err(err) => {
            log::warn!("progress storage unavailable, starting fresh: {err}");
            ProgressRecord::default()
        }
    }
}
