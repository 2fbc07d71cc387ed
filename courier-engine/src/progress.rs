//! The single persisted Progress Record and its merge-over-defaults loader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::activity::{ActivityLog, LogCategory};
use crate::checkpoint::{CheckpointKey, MachineCheck, PhaseId, ShardId};
use crate::clock::Moment;
use crate::tools::ToolId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub authenticated: bool,
    pub current_phase: PhaseId,
    pub completed_phases: BTreeSet<PhaseId>,
    pub hint_tiers: BTreeMap<CheckpointKey, u8>,
    pub activity_log: ActivityLog,
    pub unlocked_tools: BTreeSet<ToolId>,
    pub sub_checkpoints: BTreeMap<CheckpointKey, bool>,
    pub decoded_shard_values: BTreeMap<ShardId, String>,
    pub final_sequence_revealed: bool,
    pub timestamps: BTreeMap<PhaseId, DateTime<Utc>>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            authenticated: false,
            current_phase: PhaseId::FIRST,
            completed_phases: BTreeSet::new(),
            hint_tiers: BTreeMap::new(),
            activity_log: ActivityLog::new(),
            unlocked_tools: BTreeSet::new(),
            sub_checkpoints: BTreeMap::new(),
            decoded_shard_values: BTreeMap::new(),
            final_sequence_revealed: false,
            timestamps: BTreeMap::new(),
        }
    }
}

impl ProgressRecord {
    /// Rebuild a record by overlaying a persisted blob onto the defaults.
    ///
    /// The overlay is shallow: every top-level field present in the blob
    /// replaces the default wholesale, and fields the blob lacks keep their
    /// default. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not a JSON object or a present field
    /// has the wrong shape.
    pub fn merge_over_defaults(blob: &str) -> Result<Self, serde_json::Error> {
        let persisted: serde_json::Map<String, serde_json::Value> = serde_json::from_str(blob)?;
        let mut merged = match serde_json::to_value(Self::default())? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (field, value) in persisted {
            if merged.contains_key(&field) {
                merged.insert(field, value);
            }
        }
        serde_json::from_value(serde_json::Value::Object(merged))
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub(crate) fn log(&mut self, at: &Moment, message: impl Into<String>, category: LogCategory) {
        self.activity_log.record(at.label.clone(), message, category);
    }

    #[must_use]
    pub fn is_completed(&self, phase: PhaseId) -> bool {
        self.completed_phases.contains(&phase)
    }

    #[must_use]
    pub fn hint_tier(&self, key: CheckpointKey) -> u8 {
        self.hint_tiers.get(&key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn sub_checkpoint(&self, key: CheckpointKey) -> bool {
        self.sub_checkpoints.get(&key).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn machine_verified(&self, check: MachineCheck) -> bool {
        self.sub_checkpoint(CheckpointKey::Machine(check))
    }

    #[must_use]
    pub fn all_machine_checks_verified(&self) -> bool {
        MachineCheck::ALL
            .into_iter()
            .all(|check| self.machine_verified(check))
    }

    #[must_use]
    pub fn shard_verified(&self, shard: ShardId) -> bool {
        self.sub_checkpoint(CheckpointKey::Shard(shard))
    }

    /// Decoded text the participant reported for a shard, empty if none yet.
    #[must_use]
    pub fn decoded_shard(&self, shard: ShardId) -> &str {
        self.decoded_shard_values
            .get(&shard)
            .map_or("", String::as_str)
    }
}
