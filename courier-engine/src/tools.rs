//! Workbench tool catalog and the completion-driven unlock gate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::activity::LogCategory;
use crate::checkpoint::PhaseId;
use crate::clock::Moment;
use crate::constants::LOG_TOOL_UNLOCKED_PREFIX;
use crate::events::StateChange;
use crate::progress::ProgressRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    ByteGrouper,
    IntegrityCheck,
    BaseReference,
    SymbolCounter,
}

impl ToolId {
    #[must_use]
    pub fn spec(self) -> &'static ToolSpec {
        match self {
            Self::ByteGrouper => &TOOLS[0],
            Self::IntegrityCheck => &TOOLS[1],
            Self::BaseReference => &TOOLS[2],
            Self::SymbolCounter => &TOOLS[3],
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub id: ToolId,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub unlock_phase: PhaseId,
}

pub const TOOLS: [ToolSpec; 4] = [
    ToolSpec {
        id: ToolId::ByteGrouper,
        name: "Byte Grouper",
        icon: "[]",
        description: "Format binary into 8-bit groups",
        unlock_phase: PhaseId::MachineLanguage,
    },
    ToolSpec {
        id: ToolId::IntegrityCheck,
        name: "Artifact Integrity",
        icon: "?!",
        description: "Validate binary structure",
        unlock_phase: PhaseId::WorldLink,
    },
    ToolSpec {
        id: ToolId::BaseReference,
        name: "Base Reference",
        icon: "#",
        description: "Number base cheat sheet",
        unlock_phase: PhaseId::WorldLink,
    },
    ToolSpec {
        id: ToolId::SymbolCounter,
        name: "Symbol Counter",
        icon: "+",
        description: "Character frequency analysis",
        unlock_phase: PhaseId::ThreeShards,
    },
];

/// Tools whose unlock phase is present in the completed set.
pub fn earned_tools(record: &ProgressRecord) -> impl Iterator<Item = ToolId> + '_ {
    TOOLS
        .iter()
        .filter(|tool| record.completed_phases.contains(&tool.unlock_phase))
        .map(|tool| tool.id)
}

/// Grant every earned tool that is not yet unlocked, logging each once.
///
/// Derived from `completedPhases`, so running it on a freshly loaded record
/// also reconciles tools added after the record was first written.
pub fn apply_tool_gate(record: &mut ProgressRecord, at: &Moment) -> Vec<StateChange> {
    let newly: Vec<ToolId> = earned_tools(record)
        .filter(|tool| !record.unlocked_tools.contains(tool))
        .collect();
    newly
        .into_iter()
        .map(|tool| {
            record.unlocked_tools.insert(tool);
            record.log(
                at,
                format!("{LOG_TOOL_UNLOCKED_PREFIX}{}", tool.spec().name),
                LogCategory::Success,
            );
            log::debug!("tool unlocked: {tool:?}");
            StateChange::ToolUnlocked { tool }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Moment;

    #[test]
    fn catalog_lookup_matches_ids() {
        for tool in &TOOLS {
            assert_eq!(tool.id.spec().id, tool.id);
        }
        assert_eq!(ToolId::BaseReference.to_string(), "Base Reference");
        let json = serde_json::to_string(&ToolId::IntegrityCheck).unwrap();
        assert_eq!(json, "\"integrity-check\"");
    }

    #[test]
    fn gate_grants_phase_four_tools_together_once() {
        let at = Moment::fixed("11:00");
        let mut record = ProgressRecord::default();
        assert!(apply_tool_gate(&mut record, &at).is_empty());

        record.completed_phases.insert(PhaseId::WorldLink);
        let changes = apply_tool_gate(&mut record, &at);
        assert_eq!(
            changes,
            vec![
                StateChange::ToolUnlocked {
                    tool: ToolId::IntegrityCheck
                },
                StateChange::ToolUnlocked {
                    tool: ToolId::BaseReference
                },
            ]
        );
        assert_eq!(record.activity_log.count_message("Tool unlocked: Base Reference"), 1);

        assert!(apply_tool_gate(&mut record, &at).is_empty());
        assert_eq!(record.activity_log.len(), 2);
    }
}
