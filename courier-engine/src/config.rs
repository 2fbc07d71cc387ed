//! Deployment configuration consumed by the engine.
//!
//! Everything here is fixed for the lifetime of a session: identity, deadline,
//! the answer key, and the tracking value the final sequence reveals.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::checkpoint::{MachineCheck, ShardId};
use crate::constants::STORAGE_KEY_SUFFIX;

const DEFAULT_DEADLINE: &str = "2025-12-27T13:00:00-07:00";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Tracking value {tracking:?} does not equal shards A+B+C ({assembled:?})")]
    TrackingMismatch { tracking: String, assembled: String },
    #[error("Configuration field {0} must not be blank")]
    Blank(&'static str),
}

/// Expected answers for every checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub phase1: String,
    pub phase2: String,
    pub phase3_a: String,
    pub phase3_b: String,
    pub phase3_c: String,
    pub binding_code: String,
    pub shard_a: String,
    pub shard_b: String,
    pub shard_c: String,
    pub ordering: String,
}

impl AnswerKey {
    #[must_use]
    pub fn machine(&self, check: MachineCheck) -> &str {
        match check {
            MachineCheck::A => &self.phase3_a,
            MachineCheck::B => &self.phase3_b,
            MachineCheck::C => &self.phase3_c,
        }
    }

    #[must_use]
    pub fn shard(&self, shard: ShardId) -> &str {
        match shard {
            ShardId::A => &self.shard_a,
            ShardId::B => &self.shard_b,
            ShardId::C => &self.shard_c,
        }
    }

    fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("answers.phase1", self.phase1.as_str()),
            ("answers.phase2", self.phase2.as_str()),
            ("answers.phase3A", self.phase3_a.as_str()),
            ("answers.phase3B", self.phase3_b.as_str()),
            ("answers.phase3C", self.phase3_c.as_str()),
            ("answers.bindingCode", self.binding_code.as_str()),
            ("answers.shardA", self.shard_a.as_str()),
            ("answers.shardB", self.shard_b.as_str()),
            ("answers.shardC", self.shard_c.as_str()),
            ("answers.ordering", self.ordering.as_str()),
        ]
    }
}

impl Default for AnswerKey {
    fn default() -> Self {
        Self {
            phase1: "B".to_string(),
            phase2: "spawn".to_string(),
            phase3_a: "B".to_string(),
            phase3_b: "byte".to_string(),
            phase3_c: "A".to_string(),
            binding_code: "OBSIDIAN-FLUX-7742".to_string(),
            shard_a: "1Z".to_string(),
            shard_b: "09X43G03".to_string(),
            shard_c: "08186005".to_string(),
            ordering: "C".to_string(),
        }
    }
}

/// Complete deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConfig {
    pub operator_id: String,
    pub session_key: String,
    pub deadline: DateTime<FixedOffset>,
    pub answers: AnswerKey,
    pub tracking_number: String,
    #[serde(default)]
    pub world_download_link: String,
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
    #[serde(default = "default_admin_reset")]
    pub admin_reset_enabled: bool,
}

fn default_storage_prefix() -> String {
    "rcp_".to_string()
}

const fn default_admin_reset() -> bool {
    true
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            operator_id: "Ezra".to_string(),
            session_key: "RCP-2025-XMAS-COURIER".to_string(),
            deadline: DateTime::parse_from_rfc3339(DEFAULT_DEADLINE)
                .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH.fixed_offset()),
            answers: AnswerKey::default(),
            tracking_number: "1Z09X43G0308186005".to_string(),
            world_download_link: "https://example.com/redstone-courier-world.zip".to_string(),
            storage_prefix: default_storage_prefix(),
            admin_reset_enabled: default_admin_reset(),
        }
    }
}

impl ProtocolConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a required value is blank, or
    /// the tracking value is not the prefix/core/suffix concatenation of the shards.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator_id.trim().is_empty() {
            return Err(ConfigError::Blank("operatorId"));
        }
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::Blank("sessionKey"));
        }
        if let Some((name, _)) = self
            .answers
            .fields()
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
        {
            return Err(ConfigError::Blank(name));
        }
        let assembled = self.assembled_tracking_number();
        if assembled != self.tracking_number {
            return Err(ConfigError::TrackingMismatch {
                tracking: self.tracking_number.clone(),
                assembled,
            });
        }
        Ok(())
    }

    /// Shards joined in the prefix, core, suffix order.
    #[must_use]
    pub fn assembled_tracking_number(&self) -> String {
        ShardId::ALL
            .into_iter()
            .map(|shard| self.answers.shard(shard))
            .collect()
    }

    /// Key under which the progress blob is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}{STORAGE_KEY_SUFFIX}", self.storage_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_consistent() {
        let config = ProtocolConfig::default();
        config.validate().expect("default config validates");
        assert_eq!(config.storage_key(), "rcp_state");
        assert_eq!(config.deadline.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(config.answers.machine(MachineCheck::B), "byte");
        assert_eq!(config.answers.shard(ShardId::C), "08186005");
    }

    #[test]
    fn from_json_applies_defaults_for_optional_fields() {
        let mut value = serde_json::to_value(ProtocolConfig::default()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("storagePrefix");
        obj.remove("adminResetEnabled");
        obj.remove("worldDownloadLink");
        let parsed = ProtocolConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed.storage_prefix, "rcp_");
        assert!(parsed.admin_reset_enabled);
        assert!(parsed.world_download_link.is_empty());
    }

    #[test]
    fn tracking_value_must_match_shards() {
        let mut config = ProtocolConfig::default();
        config.tracking_number = "1Z0000".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::TrackingMismatch { .. }));
    }

    #[test]
    fn blank_answers_are_rejected() {
        let mut config = ProtocolConfig::default();
        config.answers.ordering = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Blank("answers.ordering")));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ProtocolConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
