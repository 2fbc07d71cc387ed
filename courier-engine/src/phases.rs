//! Phase catalog, the Locked/Active/Completed state machine, and
//! participant-facing phase views.

use serde::{Deserialize, Serialize};

use crate::activity::LogCategory;
use crate::checkpoint::{CheckpointKey, PhaseId, ShardId};
use crate::clock::Moment;
use crate::events::StateChange;
use crate::hints::{HintTable, IssuedHint};
use crate::progress::ProgressRecord;
use crate::tools::apply_tool_gate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSpec {
    pub id: PhaseId,
    pub name: &'static str,
    pub briefing: &'static str,
    pub objective: &'static str,
}

pub const PHASES: [PhaseSpec; 6] = [
    PhaseSpec {
        id: PhaseId::Whitelist,
        name: "WHITELIST PROTOCOL",
        briefing: "Before a courier can operate, they must prove they understand the foundational principles of the realm. This is not a test of skill, but of awareness.",
        objective: "In every Minecraft world, there is a concept that exists even before you move. The system anchors everything to it. What is it?",
    },
    PhaseSpec {
        id: PhaseId::Origin,
        name: "ORIGIN ASSERTION",
        briefing: "Every world has a center. A point from which all journeys begin. Without naming coordinates, the system recognizes this place by a universal term.",
        objective: "Name the place every world agrees on, even when terrain is chaos.",
    },
    PhaseSpec {
        id: PhaseId::MachineLanguage,
        name: "LANGUAGE OF MACHINES",
        briefing: "The courier network speaks in a language older than words. To decode the final payload, you must first understand how machines think.",
        objective: "Complete all three checkpoints to prove fluency in the machine tongue.",
    },
    PhaseSpec {
        id: PhaseId::WorldLink,
        name: "WORLD LINK ESTABLISHED",
        briefing: "A physical artifact has been prepared. Within a Minecraft world, at spawn, a binding code awaits. This code proves your connection to the physical delivery.",
        objective: "Download the world file, locate the binding code at spawn, and return it here.",
    },
    PhaseSpec {
        id: PhaseId::ThreeShards,
        name: "THREE SHARDS",
        briefing: "The tracking number is fragmented across three shards hidden in the world. Each encoded differently: binary, Base64, and crafter counting. Follow the path to find them all.",
        objective: "Explore the world, find each shard location, decode all three shards to reconstruct the courier identifier.",
    },
    PhaseSpec {
        id: PhaseId::CourierVision,
        name: "COURIER VISION",
        briefing: "You have all three shards. The throne room marked the assembly order. Only the correct sequence will unlock the final transmission.",
        objective: "Assemble the shards in the correct order and select the ordering rule.",
    },
];

impl PhaseId {
    #[must_use]
    pub const fn spec(self) -> &'static PhaseSpec {
        &PHASES[(self.number() - 1) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    Locked,
    Active,
    Completed,
}

impl PhaseState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Completed wins; anything at or below the current phase is workable.
#[must_use]
pub fn phase_state(record: &ProgressRecord, phase: PhaseId) -> PhaseState {
    if record.is_completed(phase) {
        PhaseState::Completed
    } else if phase <= record.current_phase {
        PhaseState::Active
    } else {
        PhaseState::Locked
    }
}

#[must_use]
pub fn can_view(record: &ProgressRecord, phase: PhaseId) -> bool {
    phase_state(record, phase) != PhaseState::Locked
}

/// Whether `key` has been satisfied in `record`.
#[must_use]
pub fn checkpoint_verified(record: &ProgressRecord, key: CheckpointKey) -> bool {
    match key {
        CheckpointKey::Login => record.authenticated,
        _ if key.is_sub_checkpoint() => record.sub_checkpoint(key),
        _ => key.phase().is_some_and(|phase| record.is_completed(phase)),
    }
}

/// Shards open strictly in order; every other checkpoint is open once its
/// phase is viewable.
#[must_use]
pub fn checkpoint_unlocked(record: &ProgressRecord, key: CheckpointKey) -> bool {
    let Some(phase) = key.phase() else {
        return true;
    };
    if !can_view(record, phase) {
        return false;
    }
    match key {
        CheckpointKey::Shard(shard) => shard
            .predecessor()
            .is_none_or(|previous| record.shard_verified(previous)),
        _ => true,
    }
}

/// Mark `phase` complete and advance the current phase by one.
///
/// Idempotent: a second call with the same phase changes nothing. Tools
/// earned by the completion are granted in the same transition.
pub fn complete_phase(record: &mut ProgressRecord, phase: PhaseId, at: &Moment) -> Vec<StateChange> {
    let mut changes = Vec::new();
    if record.completed_phases.insert(phase) {
        record.timestamps.entry(phase).or_insert(at.at);
        record.log(at, format!("Phase {phase} completed"), LogCategory::Success);
        changes.push(StateChange::PhaseCompleted { phase });
    }
    if phase == record.current_phase
        && let Some(next) = phase.next()
    {
        record.current_phase = next;
        record.log(at, format!("Phase {next} unlocked"), LogCategory::System);
        changes.push(StateChange::PhaseUnlocked { phase: next });
    }
    changes.extend(apply_tool_gate(record, at));
    if !changes.is_empty() {
        log::debug!("phase {phase} completion applied: {changes:?}");
    }
    changes
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointView {
    pub key: CheckpointKey,
    pub verified: bool,
    pub unlocked: bool,
    pub revealed_hints: Vec<IssuedHint>,
}

/// Read model of one phase for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseView {
    pub id: PhaseId,
    pub name: &'static str,
    pub briefing: &'static str,
    pub objective: &'static str,
    pub state: PhaseState,
    pub read_only: bool,
    pub checkpoints: Vec<CheckpointView>,
    /// Decoded shard values carried into the final assembly form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<[String; 3]>,
}

#[must_use]
pub fn view_phase(
    record: &ProgressRecord,
    hints: &HintTable,
    phase: PhaseId,
    frozen: bool,
) -> Option<PhaseView> {
    if !can_view(record, phase) {
        return None;
    }
    let spec = phase.spec();
    let state = phase_state(record, phase);
    let checkpoints = phase
        .checkpoints()
        .iter()
        .map(|&key| CheckpointView {
            key,
            verified: checkpoint_verified(record, key),
            unlocked: checkpoint_unlocked(record, key),
            revealed_hints: hints.revealed(record, key),
        })
        .collect();
    let prefill = (phase == PhaseId::CourierVision)
        .then(|| ShardId::ALL.map(|shard| record.decoded_shard(shard).to_string()));
    Some(PhaseView {
        id: phase,
        name: spec.name,
        briefing: spec.briefing,
        objective: spec.objective,
        state,
        read_only: state == PhaseState::Completed || frozen,
        checkpoints,
        prefill,
    })
}
