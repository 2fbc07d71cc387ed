//! Change notifications emitted after each committed mutation.
//!
//! The presentation layer subscribes to these instead of being called from
//! inside state transitions.

use serde::{Deserialize, Serialize};

use crate::checkpoint::{CheckpointKey, PhaseId};
use crate::tools::ToolId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateChange {
    Authenticated,
    CheckpointVerified { key: CheckpointKey },
    PhaseCompleted { phase: PhaseId },
    PhaseUnlocked { phase: PhaseId },
    ToolUnlocked { tool: ToolId },
    HintIssued { key: CheckpointKey, tier: u8 },
    Frozen,
    RevealStarted,
    RevealCompleted,
    Reset,
}

/// Callback invoked with the batch of changes from one handler and the
/// resulting record.
pub type Observer = Box<dyn FnMut(&[StateChange], &crate::progress::ProgressRecord)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_serialize_with_kind_tag() {
        let change = StateChange::HintIssued {
            key: CheckpointKey::Whitelist,
            tier: 2,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "hint_issued", "key": "phase1", "tier": 2 })
        );
        let unlocked = serde_json::to_value(StateChange::PhaseUnlocked {
            phase: PhaseId::Origin,
        })
        .unwrap();
        assert_eq!(unlocked["phase"], 2);
    }
}
