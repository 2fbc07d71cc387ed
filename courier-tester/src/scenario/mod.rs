use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use courier_engine::{
    Answer, CheckpointKey, MachineCheck, ManualClock, MemoryStorage, ProtocolConfig,
    ProtocolSession, ShardId, Verdict,
};

pub mod flows;

pub type Session = ProtocolSession<MemoryStorage, ManualClock>;

#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub config: ProtocolConfig,
    pub seed: u64,
    pub verbose: bool,
}

impl ScenarioCtx {
    /// Start of the session window used by scripted runs.
    #[must_use]
    pub fn opening_time(&self) -> DateTime<Utc> {
        self.config.deadline.with_timezone(&Utc) - Duration::hours(24)
    }

    /// Fresh in-memory session whose clock the scenario drives.
    #[must_use]
    pub fn open(&self, now: DateTime<Utc>) -> (Session, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(now);
        let session = ProtocolSession::open(self.config.clone(), storage.clone(), clock.clone())
            .with_reveal_seed(self.seed);
        (session, storage, clock)
    }

    /// Checkpoints up to and including shard C, paired with their configured answers.
    #[must_use]
    pub fn scripted_answers(&self) -> Vec<(CheckpointKey, String)> {
        let answers = &self.config.answers;
        vec![
            (CheckpointKey::Whitelist, answers.phase1.clone()),
            (CheckpointKey::Origin, answers.phase2.clone()),
            (CheckpointKey::Machine(MachineCheck::A), answers.phase3_a.clone()),
            (CheckpointKey::Machine(MachineCheck::B), answers.phase3_b.clone()),
            (CheckpointKey::Machine(MachineCheck::C), answers.phase3_c.clone()),
            (CheckpointKey::Binding, answers.binding_code.clone()),
            (CheckpointKey::Shard(ShardId::A), answers.shard_a.clone()),
            (CheckpointKey::Shard(ShardId::B), answers.shard_b.clone()),
            (CheckpointKey::Shard(ShardId::C), answers.shard_c.clone()),
        ]
    }

    #[must_use]
    pub fn final_assembly(&self) -> Answer {
        let answers = &self.config.answers;
        Answer::assembly(
            answers.shard_a.as_str(),
            answers.shard_b.as_str(),
            answers.shard_c.as_str(),
            answers.ordering.as_str(),
        )
    }

    pub fn login(&self, session: &mut Session) -> Result<()> {
        let verdict = session.authenticate(&self.config.operator_id, &self.config.session_key)?;
        anyhow::ensure!(verdict == Verdict::Accepted, "login rejected: {verdict:?}");
        Ok(())
    }

    /// Authenticate and solve every checkpoint before the final assembly.
    pub fn play_through_shards(&self, session: &mut Session) -> Result<()> {
        self.login(session)?;
        for (key, value) in self.scripted_answers() {
            let verdict = session.submit_answer(key, &Answer::text(value))?;
            anyhow::ensure!(verdict == Verdict::Accepted, "{key} rejected: {verdict:?}");
            if self.verbose {
                log::info!("{key} accepted");
            }
        }
        Ok(())
    }
}

pub type ScenarioFn = fn(&ScenarioCtx) -> Result<()>;

#[derive(Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[TestScenario] = &[
    TestScenario {
        key: "smoke",
        description: "Login and phase 1 acceptance persist to storage",
        run: flows::smoke,
    },
    TestScenario {
        key: "full-run",
        description: "Solve every phase and watch the reveal to completion",
        run: flows::full_run,
    },
    TestScenario {
        key: "hint-ladder",
        description: "Wrong answers climb the hint ladder and stop at its top",
        run: flows::hint_ladder,
    },
    TestScenario {
        key: "deadline-freeze",
        description: "Crossing the deadline freezes the session exactly once",
        run: flows::deadline_freeze,
    },
    TestScenario {
        key: "shard-ordering",
        description: "Shards unlock in order and final assembly checks content before ordering",
        run: flows::shard_ordering,
    },
    TestScenario {
        key: "resume",
        description: "Reloading from storage resumes progress and reconciles tools",
        run: flows::resume,
    },
];

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    CATALOG
        .iter()
        .find(|scenario| scenario.key.eq_ignore_ascii_case(key.trim()))
        .copied()
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

/// Expand `all` into every catalog key; other names pass through.
#[must_use]
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    if requested.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        return CATALOG.iter().map(|s| s.key.to_string()).collect();
    }
    requested.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ScenarioCtx {
        ScenarioCtx {
            config: ProtocolConfig::default(),
            seed: 7,
            verbose: false,
        }
    }

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert_eq!(get_scenario(" Full-Run ").map(|s| s.key), Some("full-run"));
        assert!(get_scenario("boss-fight").is_none());
    }

    #[test]
    fn all_expands_to_catalog() {
        let expanded = expand_scenarios(&["all".to_string()]);
        assert_eq!(expanded.len(), list_scenarios().len());
        assert_eq!(
            expand_scenarios(&["smoke".to_string()]),
            vec!["smoke".to_string()]
        );
    }

    #[test]
    fn every_catalog_scenario_passes_on_default_config() {
        let ctx = ctx();
        for scenario in CATALOG {
            (scenario.run)(&ctx).unwrap_or_else(|err| panic!("{}: {err:#}", scenario.key));
        }
    }
}
