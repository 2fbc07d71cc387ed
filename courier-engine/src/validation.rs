//! Answer normalization and judging against the configured answer key.
//!
//! Everything here is pure: the same key and input always produce the same
//! verdict, and nothing touches the progress record.

use serde::{Deserialize, Serialize};

use crate::checkpoint::{AnswerKind, CheckpointKey, MachineCheck, ShardId};
use crate::config::ProtocolConfig;
use crate::error::SubmitError;

/// Raw participant input for one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Answer {
    /// A multiple-choice letter, free-text term, or decoded shard.
    Text { value: String },
    /// Login form.
    #[serde(rename_all = "camelCase")]
    Credentials {
        operator: String,
        session_key: String,
    },
    /// Final assembly: the three decoded shards plus the ordering letter.
    Assembly { shards: [String; 3], ordering: String },
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn credentials(operator: impl Into<String>, session_key: impl Into<String>) -> Self {
        Self::Credentials {
            operator: operator.into(),
            session_key: session_key.into(),
        }
    }

    pub fn assembly(
        shard_a: impl Into<String>,
        shard_b: impl Into<String>,
        shard_c: impl Into<String>,
        ordering: impl Into<String>,
    ) -> Self {
        Self::Assembly {
            shards: [shard_a.into(), shard_b.into(), shard_c.into()],
            ordering: ordering.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The single expected value for this checkpoint did not match.
    Mismatch(CheckpointKey),
    /// At least one re-entered shard differs from its verified value.
    ShardContent,
    /// Shards were right but the ordering letter was not.
    OrderingRule,
}

impl Rejection {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Mismatch(CheckpointKey::Login) => {
                "AUTHENTICATION FAILED. Credentials do not match whitelist."
            }
            Self::Mismatch(CheckpointKey::Whitelist) => {
                "REJECTED. Selection does not match expected value."
            }
            Self::Mismatch(CheckpointKey::Origin) => "REJECTED. Term does not match system records.",
            Self::Mismatch(CheckpointKey::Machine(MachineCheck::A)) => {
                "REJECTED. Incorrect interpretation."
            }
            Self::Mismatch(CheckpointKey::Machine(MachineCheck::B)) => "REJECTED. Term unrecognized.",
            Self::Mismatch(CheckpointKey::Machine(MachineCheck::C)) => "REJECTED. Base mismatch.",
            Self::Mismatch(CheckpointKey::Binding) => {
                "REJECTED. Binding code does not match registered artifact."
            }
            Self::Mismatch(CheckpointKey::Shard(_)) => "REJECTED. Decoded value incorrect.",
            Self::ShardContent | Self::Mismatch(CheckpointKey::FinalAssembly) => {
                "REJECTED. Shard values do not match verified fragments."
            }
            Self::OrderingRule => "REJECTED. Ordering rule incorrect.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Participant-facing response line for this verdict on `key`.
    #[must_use]
    pub const fn message(self, key: CheckpointKey) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.message(),
            Self::Accepted => match key {
                CheckpointKey::Login => "AUTHENTICATION SUCCESSFUL. Loading protocol...",
                CheckpointKey::Whitelist => "ACCEPTED. Whitelist protocol confirmed.",
                CheckpointKey::Origin => "ACCEPTED. Origin assertion verified.",
                CheckpointKey::Machine(MachineCheck::A) => "ACCEPTED. Checkpoint 3A verified.",
                CheckpointKey::Machine(MachineCheck::B) => "ACCEPTED. Checkpoint 3B verified.",
                CheckpointKey::Machine(MachineCheck::C) => "ACCEPTED. Checkpoint 3C verified.",
                CheckpointKey::Binding => {
                    "ACCEPTED. World link established. Physical artifact confirmed."
                }
                CheckpointKey::Shard(ShardId::A) => {
                    "SHARD A VERIFIED. Location for Shard B unlocked."
                }
                CheckpointKey::Shard(ShardId::B) => {
                    "SHARD B VERIFIED. Location for Shard C unlocked."
                }
                CheckpointKey::Shard(ShardId::C) => {
                    "SHARD C VERIFIED. All shards collected. Proceed to final assembly."
                }
                CheckpointKey::FinalAssembly => "ACCEPTED. Initiating decryption sequence...",
            },
        }
    }
}

/// Canonical comparison form of `raw` for an answer kind.
#[must_use]
pub fn normalize(kind: AnswerKind, raw: &str) -> String {
    let trimmed = raw.trim();
    match kind {
        AnswerKind::MultipleChoice => trimmed.to_uppercase(),
        AnswerKind::FreeText => trimmed.to_lowercase(),
        AnswerKind::DecodedShard | AnswerKind::Credentials | AnswerKind::Composite => {
            trimmed.to_string()
        }
    }
}

fn non_blank(key: CheckpointKey, raw: &str) -> Result<(), SubmitError> {
    if raw.trim().is_empty() {
        Err(SubmitError::BlankInput(key))
    } else {
        Ok(())
    }
}

fn judge(matched: bool, rejection: Rejection) -> Verdict {
    if matched {
        Verdict::Accepted
    } else {
        Verdict::Rejected(rejection)
    }
}

/// Judge `answer` for `key` against the configured answer key.
///
/// # Errors
///
/// Returns [`SubmitError::BlankInput`] when any required field is blank after
/// trimming, or [`SubmitError::AnswerShape`] when the answer variant does not
/// fit the checkpoint.
pub fn validate(
    config: &ProtocolConfig,
    key: CheckpointKey,
    answer: &Answer,
) -> Result<Verdict, SubmitError> {
    let answers = &config.answers;
    match (key, answer) {
        (
            CheckpointKey::Login,
            Answer::Credentials {
                operator,
                session_key,
            },
        ) => {
            non_blank(key, operator)?;
            non_blank(key, session_key)?;
            let operator_ok = normalize(AnswerKind::FreeText, operator)
                == normalize(AnswerKind::FreeText, &config.operator_id);
            let session_ok = session_key.trim() == config.session_key;
            Ok(judge(operator_ok && session_ok, Rejection::Mismatch(key)))
        }
        (CheckpointKey::FinalAssembly, Answer::Assembly { shards, ordering }) => {
            for shard in shards {
                non_blank(key, shard)?;
            }
            non_blank(key, ordering)?;
            let shards_ok = ShardId::ALL
                .into_iter()
                .zip(shards)
                .all(|(id, value)| value.trim() == answers.shard(id).trim());
            if !shards_ok {
                return Ok(Verdict::Rejected(Rejection::ShardContent));
            }
            let ordering_ok = normalize(AnswerKind::MultipleChoice, ordering)
                == normalize(AnswerKind::MultipleChoice, &answers.ordering);
            Ok(judge(ordering_ok, Rejection::OrderingRule))
        }
        (CheckpointKey::Login | CheckpointKey::FinalAssembly, _) => {
            Err(SubmitError::AnswerShape(key))
        }
        (_, Answer::Text { value }) => {
            non_blank(key, value)?;
            let expected = match key {
                CheckpointKey::Whitelist => answers.phase1.as_str(),
                CheckpointKey::Origin => answers.phase2.as_str(),
                CheckpointKey::Machine(check) => answers.machine(check),
                CheckpointKey::Binding => answers.binding_code.as_str(),
                CheckpointKey::Shard(shard) => answers.shard(shard),
                CheckpointKey::Login | CheckpointKey::FinalAssembly => {
                    return Err(SubmitError::AnswerShape(key));
                }
            };
            let kind = key.answer_kind();
            Ok(judge(
                normalize(kind, value) == normalize(kind, expected),
                Rejection::Mismatch(key),
            ))
        }
        (_, _) => Err(SubmitError::AnswerShape(key)),
    }
}
