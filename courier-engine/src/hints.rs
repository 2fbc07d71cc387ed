//! Tiered hint ledger.
//!
//! Each checkpoint owns an ordered list of hints; the tier counter in the
//! progress record only ever moves forward and never passes the list length.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::activity::LogCategory;
use crate::checkpoint::{CheckpointKey, MachineCheck, ShardId};
use crate::clock::Moment;
use crate::config::ProtocolConfig;
use crate::events::StateChange;
use crate::progress::ProgressRecord;

/// A hint handed to the participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedHint {
    /// One-based tier that was just unlocked.
    pub tier: u8,
    pub text: String,
}

/// Hint lists for every checkpoint, with configuration values baked in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintTable {
    hints: BTreeMap<CheckpointKey, Vec<String>>,
}

impl HintTable {
    #[must_use]
    pub fn from_config(config: &ProtocolConfig) -> Self {
        let answers = &config.answers;
        let hints = CheckpointKey::ALL
            .into_iter()
            .map(|key| {
                let list: Vec<String> = match key {
                    CheckpointKey::Login => vec![
                        "Operator ID must match whitelist.".into(),
                        "Operator ID is printed on the card.".into(),
                        format!(
                            "Operator ID: {}. Session Key: {}",
                            config.operator_id, config.session_key
                        ),
                    ],
                    CheckpointKey::Whitelist => vec![
                        "It is not something you craft or find.".into(),
                        "It is where your first step begins.".into(),
                        format!("Choose option {}.", answers.phase1),
                    ],
                    CheckpointKey::Origin => vec![
                        "Minecraft uses this word constantly.".into(),
                        "It is where you appear.".into(),
                        format!("Type: {}", answers.phase2),
                    ],
                    CheckpointKey::Machine(MachineCheck::A) => vec![
                        "Not physical.".into(),
                        "Interprets the value.".into(),
                        format!("Choose {}.", answers.phase3_a),
                    ],
                    CheckpointKey::Machine(MachineCheck::B) => vec![
                        "Small chunk.".into(),
                        "Eight bits.".into(),
                        format!("Type: {}", answers.phase3_b),
                    ],
                    CheckpointKey::Machine(MachineCheck::C) => vec![
                        "Two symbols.".into(),
                        "0 and 1.".into(),
                        format!("Choose {}.", answers.phase3_c),
                    ],
                    CheckpointKey::Binding => vec![
                        "It is visible at spawn.".into(),
                        "It is labeled BINDING CODE.".into(),
                        format!("Enter exactly: {}", answers.binding_code),
                    ],
                    CheckpointKey::Shard(ShardId::A) => vec![
                        "Two symbols.".into(),
                        "Binary to digits.".into(),
                        format!("Decoded shard A must be: {}", answers.shard_a),
                    ],
                    CheckpointKey::Shard(ShardId::B) => vec![
                        "Too clean to be natural.".into(),
                        "Moves data safely through systems.".into(),
                        format!("This is Base64. Decoded shard B must be: {}", answers.shard_b),
                    ],
                    CheckpointKey::Shard(ShardId::C) => vec![
                        "Count like a crafter.".into(),
                        "Grouping and stacks matter.".into(),
                        format!("Decoded shard C must be: {}", answers.shard_c),
                    ],
                    CheckpointKey::FinalAssembly => vec![
                        "It is not random.".into(),
                        "One shard clearly belongs at the start.".into(),
                        format!("Choose option {}.", answers.ordering),
                    ],
                };
                (key, list)
            })
            .collect();
        Self { hints }
    }

    #[must_use]
    pub fn hints(&self, key: CheckpointKey) -> &[String] {
        self.hints.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Number of tiers available for a checkpoint.
    #[must_use]
    pub fn max_tier(&self, key: CheckpointKey) -> u8 {
        u8::try_from(self.hints(key).len()).unwrap_or(u8::MAX)
    }

    /// Hints the participant has already unlocked, lowest tier first.
    #[must_use]
    pub fn revealed(&self, record: &ProgressRecord, key: CheckpointKey) -> Vec<IssuedHint> {
        let unlocked = usize::from(record.hint_tier(key));
        self.hints(key)
            .iter()
            .take(unlocked)
            .zip(1u8..)
            .map(|(text, tier)| IssuedHint {
                tier,
                text: text.clone(),
            })
            .collect()
    }
}

/// Advance the tier for `key` by one and return the newly unlocked hint.
///
/// At the last tier this returns `None` and leaves the record untouched.
pub fn issue_hint(
    record: &mut ProgressRecord,
    table: &HintTable,
    key: CheckpointKey,
    at: &Moment,
) -> Option<(IssuedHint, StateChange)> {
    let current = record.hint_tier(key);
    let text = table.hints(key).get(usize::from(current))?.clone();
    let tier = current + 1;
    record.hint_tiers.insert(key, tier);
    record.log(at, format!("Hint Tier {tier} issued"), LogCategory::Hint);
    log::debug!("hint {key} advanced to tier {tier}");
    Some((IssuedHint { tier, text }, StateChange::HintIssued { key, tier }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HintTable {
        HintTable::from_config(&ProtocolConfig::default())
    }

    #[test]
    fn every_checkpoint_has_three_tiers() {
        let table = table();
        for key in CheckpointKey::ALL {
            assert_eq!(table.max_tier(key), 3, "{key}");
        }
    }

    #[test]
    fn final_tiers_embed_configured_answers() {
        let table = table();
        assert_eq!(
            table.hints(CheckpointKey::Login)[2],
            "Operator ID: Ezra. Session Key: RCP-2025-XMAS-COURIER"
        );
        assert_eq!(
            table.hints(CheckpointKey::Binding)[2],
            "Enter exactly: OBSIDIAN-FLUX-7742"
        );
        assert_eq!(
            table.hints(CheckpointKey::Shard(ShardId::B))[2],
            "This is Base64. Decoded shard B must be: 09X43G03"
        );
    }

    #[test]
    fn ladder_ratchets_then_stops_without_mutation() {
        let table = table();
        let at = Moment::fixed("09:30");
        let mut record = ProgressRecord::default();
        let key = CheckpointKey::Origin;

        let (first, change) = issue_hint(&mut record, &table, key, &at).unwrap();
        assert_eq!(first.tier, 1);
        assert_eq!(first.text, "Minecraft uses this word constantly.");
        assert_eq!(change, StateChange::HintIssued { key, tier: 1 });
        issue_hint(&mut record, &table, key, &at).unwrap();
        let (last, _) = issue_hint(&mut record, &table, key, &at).unwrap();
        assert_eq!(last.text, "Type: spawn");

        let frozen = record.clone();
        assert!(issue_hint(&mut record, &table, key, &at).is_none());
        assert_eq!(record, frozen);
        assert_eq!(record.activity_log.count_message("Hint Tier 3 issued"), 1);
        assert_eq!(record.hint_tier(CheckpointKey::Whitelist), 0);
    }

    #[test]
    fn revealed_lists_only_unlocked_tiers() {
        let table = table();
        let mut record = ProgressRecord::default();
        record.hint_tiers.insert(CheckpointKey::FinalAssembly, 2);
        let revealed = table.revealed(&record, CheckpointKey::FinalAssembly);
        assert_eq!(revealed.len(), 2);
        assert_eq!(revealed[1].tier, 2);
        assert_eq!(revealed[1].text, "One shard clearly belongs at the start.");
        assert!(table.revealed(&record, CheckpointKey::Login).is_empty());
    }
}
