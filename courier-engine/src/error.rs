use thiserror::Error;

use crate::checkpoint::{CheckpointKey, PhaseId};

/// A submission that could not be judged at all.
///
/// Wrong answers are not errors; they come back as
/// [`Verdict::Rejected`](crate::validation::Verdict::Rejected).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Session is not authenticated")]
    NotAuthenticated,
    #[error("Authorization window closed; protocol is read-only")]
    Frozen,
    #[error("Phase {0} is locked")]
    PhaseLocked(PhaseId),
    #[error("Phase {0} is already complete")]
    PhaseCompleted(PhaseId),
    #[error("Checkpoint {0} is not yet reachable")]
    CheckpointLocked(CheckpointKey),
    #[error("Checkpoint {0} is already verified")]
    AlreadyVerified(CheckpointKey),
    #[error("Checkpoint {0} requires a non-blank answer")]
    BlankInput(CheckpointKey),
    #[error("Answer has the wrong shape for checkpoint {0}")]
    AnswerShape(CheckpointKey),
}

/// Failure of a progress storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage write failed: {0}")]
    WriteFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
