//! Typed identifiers for phases, checkpoints, and shards.
//!
//! Persisted maps are keyed by these types; their string forms are the stable
//! wire names used in the stored blob (`phase3A`, `phase5C`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{MAX_PHASE, MIN_PHASE};

/// Top-level phase of the protocol, in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PhaseId {
    Whitelist,
    Origin,
    MachineLanguage,
    WorldLink,
    ThreeShards,
    CourierVision,
}

impl PhaseId {
    pub const ALL: [Self; 6] = [
        Self::Whitelist,
        Self::Origin,
        Self::MachineLanguage,
        Self::WorldLink,
        Self::ThreeShards,
        Self::CourierVision,
    ];

    pub const FIRST: Self = Self::Whitelist;
    pub const LAST: Self = Self::CourierVision;

    /// One-based phase number as shown to the participant.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Whitelist => 1,
            Self::Origin => 2,
            Self::MachineLanguage => 3,
            Self::WorldLink => 4,
            Self::ThreeShards => 5,
            Self::CourierVision => 6,
        }
    }

    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Whitelist),
            2 => Some(Self::Origin),
            3 => Some(Self::MachineLanguage),
            4 => Some(Self::WorldLink),
            5 => Some(Self::ThreeShards),
            6 => Some(Self::CourierVision),
            _ => None,
        }
    }

    /// The phase that unlocks after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Checkpoints that belong to this phase, in display order.
    #[must_use]
    pub const fn checkpoints(self) -> &'static [CheckpointKey] {
        match self {
            Self::Whitelist => &[CheckpointKey::Whitelist],
            Self::Origin => &[CheckpointKey::Origin],
            Self::MachineLanguage => &[
                CheckpointKey::Machine(MachineCheck::A),
                CheckpointKey::Machine(MachineCheck::B),
                CheckpointKey::Machine(MachineCheck::C),
            ],
            Self::WorldLink => &[CheckpointKey::Binding],
            Self::ThreeShards => &[
                CheckpointKey::Shard(ShardId::A),
                CheckpointKey::Shard(ShardId::B),
                CheckpointKey::Shard(ShardId::C),
            ],
            Self::CourierVision => &[CheckpointKey::FinalAssembly],
        }
    }
}

impl Default for PhaseId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl From<PhaseId> for u8 {
    fn from(value: PhaseId) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for PhaseId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value)
            .ok_or_else(|| format!("phase {value} outside {MIN_PHASE}..={MAX_PHASE}"))
    }
}

/// One of the three encoded fragments of the tracking value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShardId {
    A,
    B,
    C,
}

impl ShardId {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// The shard that must be verified before this one becomes reachable.
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        match self {
            Self::A => None,
            Self::B => Some(Self::A),
            Self::C => Some(Self::B),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent sub-checkpoints of the machine-language phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineCheck {
    A,
    B,
    C,
}

impl MachineCheck {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

/// How raw input for a checkpoint is normalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Trim, uppercase, compare to a single letter.
    MultipleChoice,
    /// Trim, lowercase, exact compare.
    FreeText,
    /// Trim only; case is meaningful.
    DecodedShard,
    /// Operator id (case-insensitive) plus session key (exact).
    Credentials,
    /// Three decoded shards plus the ordering letter.
    Composite,
}

/// A single answerable unit with its own hint ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CheckpointKey {
    Login,
    Whitelist,
    Origin,
    Machine(MachineCheck),
    Binding,
    Shard(ShardId),
    FinalAssembly,
}

impl CheckpointKey {
    pub const ALL: [Self; 11] = [
        Self::Login,
        Self::Whitelist,
        Self::Origin,
        Self::Machine(MachineCheck::A),
        Self::Machine(MachineCheck::B),
        Self::Machine(MachineCheck::C),
        Self::Binding,
        Self::Shard(ShardId::A),
        Self::Shard(ShardId::B),
        Self::Shard(ShardId::C),
        Self::FinalAssembly,
    ];

    /// Containing phase; the login gate belongs to no phase.
    #[must_use]
    pub const fn phase(self) -> Option<PhaseId> {
        match self {
            Self::Login => None,
            Self::Whitelist => Some(PhaseId::Whitelist),
            Self::Origin => Some(PhaseId::Origin),
            Self::Machine(_) => Some(PhaseId::MachineLanguage),
            Self::Binding => Some(PhaseId::WorldLink),
            Self::Shard(_) => Some(PhaseId::ThreeShards),
            Self::FinalAssembly => Some(PhaseId::CourierVision),
        }
    }

    #[must_use]
    pub const fn answer_kind(self) -> AnswerKind {
        match self {
            Self::Login => AnswerKind::Credentials,
            Self::Whitelist | Self::Machine(MachineCheck::A | MachineCheck::C) => {
                AnswerKind::MultipleChoice
            }
            Self::Origin | Self::Machine(MachineCheck::B) | Self::Binding => AnswerKind::FreeText,
            Self::Shard(_) => AnswerKind::DecodedShard,
            Self::FinalAssembly => AnswerKind::Composite,
        }
    }

    /// True for the sub-checkpoints tracked in the record's `subCheckpoints` map.
    #[must_use]
    pub const fn is_sub_checkpoint(self) -> bool {
        matches!(self, Self::Machine(_) | Self::Shard(_))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Whitelist => "phase1",
            Self::Origin => "phase2",
            Self::Machine(MachineCheck::A) => "phase3A",
            Self::Machine(MachineCheck::B) => "phase3B",
            Self::Machine(MachineCheck::C) => "phase3C",
            Self::Binding => "phase4",
            Self::Shard(ShardId::A) => "phase5A",
            Self::Shard(ShardId::B) => "phase5B",
            Self::Shard(ShardId::C) => "phase5C",
            Self::FinalAssembly => "phase6",
        }
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown checkpoint key: {s}"))
    }
}

impl From<CheckpointKey> for String {
    fn from(value: CheckpointKey) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<String> for CheckpointKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
