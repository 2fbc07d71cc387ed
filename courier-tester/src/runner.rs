use colored::Colorize;
use courier_engine::ProtocolConfig;
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};

use crate::scenario::{ScenarioCtx, TestScenario};

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(rename = "average_ms", serialize_with = "fractional_millis")]
    pub average_duration: Duration,
}

pub struct ScenarioRunner {
    config: ProtocolConfig,
    verbose: bool,
}

impl ScenarioRunner {
    pub const fn new(config: ProtocolConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// One result per seed; each seed runs the scenario `iterations` times.
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key.bright_white()
                    );
                }
                self.run_single(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single(&self, scenario: &TestScenario, seed: u64, iterations: usize) -> ScenarioResult {
        let ctx = ScenarioCtx {
            config: self.config.clone(),
            seed,
            verbose: self.verbose,
        };
        let mut failures = Vec::new();
        let mut timings = Vec::with_capacity(iterations);

        for iteration in 0..iterations {
            let start = Instant::now();
            let outcome = (scenario.run)(&ctx);
            timings.push(start.elapsed());
            if let Err(err) = outcome {
                log::debug!("{} iteration {iteration} failed: {err:#}", scenario.key);
                failures.push(format!("iteration {}: {err:#}", iteration + 1));
            }
        }

        let average_duration = if timings.is_empty() {
            Duration::ZERO
        } else {
            timings.iter().sum::<Duration>() / u32::try_from(timings.len()).unwrap_or(u32::MAX)
        };

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: iterations - failures.len(),
            failures,
            average_duration,
        }
    }
}

/// Scenario runs are sub-millisecond, so keep the fraction.
#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_precision_loss)]
fn fractional_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_micros() as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::get_scenario;

    #[test]
    fn smoke_passes_for_every_seed() {
        let runner = ScenarioRunner::new(ProtocolConfig::default(), false);
        let scenario = get_scenario("smoke").unwrap();
        let results = runner.run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed && r.successful_iterations == 2));
    }

    #[test]
    fn failures_are_collected_per_iteration() {
        let scenario = TestScenario {
            key: "always-fails",
            description: "",
            run: |_| anyhow::bail!("boom"),
        };
        let runner = ScenarioRunner::new(ProtocolConfig::default(), false);
        let result = &runner.run_scenario(&scenario, &[9], 3)[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures[2], "iteration 3: boom");
    }

    #[test]
    fn result_reports_average_in_fractional_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".into(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: vec![],
            average_duration: Duration::from_micros(12_500),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_ms"], 12.5);
        assert!(json.get("average_duration").is_none());
    }
}
