//! Conversions between the JavaScript-facing surface and engine types.
//!
//! Kept free of `JsValue` so it runs under native tests.

use courier_engine::{
    Answer, CheckpointKey, PhaseId, ProgressRecord, ProtocolConfig, SubmitError, TOOLS, ToolId,
    Verdict,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacadeError {
    #[error("Unknown checkpoint key: {0}")]
    UnknownCheckpoint(String),
    #[error("Unknown phase: {0}")]
    UnknownPhase(u8),
    #[error("Invalid answer payload: {0}")]
    Payload(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// # Errors
///
/// Returns [`FacadeError::UnknownCheckpoint`] for names outside the catalog.
pub fn parse_checkpoint(key: &str) -> Result<CheckpointKey, FacadeError> {
    key.trim()
        .parse()
        .map_err(|_| FacadeError::UnknownCheckpoint(key.to_string()))
}

/// # Errors
///
/// Returns [`FacadeError::UnknownPhase`] outside `1..=6`.
pub fn parse_phase(number: u8) -> Result<PhaseId, FacadeError> {
    PhaseId::from_number(number).ok_or(FacadeError::UnknownPhase(number))
}

/// Use the shipped deployment when no document is given.
///
/// # Errors
///
/// Returns [`FacadeError::Config`] when the document fails to parse or validate.
pub fn load_config(json: Option<&str>) -> Result<ProtocolConfig, FacadeError> {
    match json.map(str::trim).filter(|doc| !doc.is_empty()) {
        Some(doc) => ProtocolConfig::from_json(doc).map_err(|err| FacadeError::Config(err.to_string())),
        None => Ok(ProtocolConfig::default()),
    }
}

/// Bare strings are shorthand for a text answer.
///
/// # Errors
///
/// Returns [`FacadeError::Payload`] if the JSON matches no answer shape.
pub fn answer_from_json(json: &str) -> Result<Answer, FacadeError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| FacadeError::Payload(err.to_string()))?;
    match value {
        serde_json::Value::String(text) => Ok(Answer::text(text)),
        other => serde_json::from_value(other).map_err(|err| FacadeError::Payload(err.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub accepted: bool,
    pub message: &'static str,
    pub verdict: Verdict,
}

impl SubmissionOutcome {
    #[must_use]
    pub const fn new(key: CheckpointKey, verdict: Verdict) -> Self {
        Self {
            accepted: verdict.is_accepted(),
            message: verdict.message(key),
            verdict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolState {
    pub id: ToolId,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub unlock_phase: PhaseId,
    pub unlocked: bool,
}

/// Workbench catalog annotated with what this record has unlocked.
#[must_use]
pub fn tool_states(record: &ProgressRecord) -> Vec<ToolState> {
    TOOLS
        .iter()
        .map(|tool| ToolState {
            id: tool.id,
            name: tool.name,
            icon: tool.icon,
            description: tool.description,
            unlock_phase: tool.unlock_phase,
            unlocked: record.unlocked_tools.contains(&tool.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_engine::{Rejection, ShardId};

    #[test]
    fn checkpoint_names_parse_with_whitespace() {
        assert_eq!(
            parse_checkpoint(" phase5C "),
            Ok(CheckpointKey::Shard(ShardId::C))
        );
        assert_eq!(
            parse_checkpoint("phase8"),
            Err(FacadeError::UnknownCheckpoint("phase8".into()))
        );
        assert_eq!(parse_phase(0), Err(FacadeError::UnknownPhase(0)));
        assert_eq!(parse_phase(6), Ok(PhaseId::CourierVision));
    }

    #[test]
    fn answers_accept_bare_strings_and_tagged_objects() {
        assert_eq!(answer_from_json(r#""spawn""#), Ok(Answer::text("spawn")));
        assert_eq!(
            answer_from_json(r#"{"type":"credentials","operator":"Ezra","sessionKey":"k"}"#),
            Ok(Answer::credentials("Ezra", "k"))
        );
        assert_eq!(
            answer_from_json(
                r#"{"type":"assembly","shards":["1Z","09X43G03","08186005"],"ordering":"C"}"#
            ),
            Ok(Answer::assembly("1Z", "09X43G03", "08186005", "C"))
        );
        assert!(matches!(
            answer_from_json("42"),
            Err(FacadeError::Payload(_))
        ));
    }

    #[test]
    fn missing_config_uses_the_shipped_deployment() {
        assert_eq!(load_config(None), Ok(ProtocolConfig::default()));
        assert_eq!(load_config(Some("  ")), Ok(ProtocolConfig::default()));
        assert!(matches!(load_config(Some("{")), Err(FacadeError::Config(_))));
    }

    #[test]
    fn outcome_carries_participant_message() {
        let outcome = SubmissionOutcome::new(
            CheckpointKey::FinalAssembly,
            Verdict::Rejected(Rejection::OrderingRule),
        );
        assert!(!outcome.accepted);
        assert_eq!(outcome.message, "REJECTED. Ordering rule incorrect.");
    }

    #[test]
    fn tool_states_flag_unlocked_entries() {
        let mut record = ProgressRecord::default();
        record.unlocked_tools.insert(ToolId::SymbolCounter);
        let states = tool_states(&record);
        assert_eq!(states.len(), 4);
        assert!(states.iter().any(|t| t.id == ToolId::SymbolCounter && t.unlocked));
        assert!(states.iter().filter(|t| t.unlocked).count() == 1);
    }
}
