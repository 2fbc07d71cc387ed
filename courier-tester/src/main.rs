mod reports;
mod runner;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use courier_engine::ProtocolConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use runner::{ScenarioResult, ScenarioRunner};
use scenario::{expand_scenarios, get_scenario, list_scenarios};

#[derive(Debug, Parser)]
#[command(name = "courier-tester", version)]
#[command(about = "Scripted QA playthroughs for the Redstone Courier Protocol engine")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Reveal seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Deployment configuration JSON; the shipped deployment when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }
    announce_banner();

    let start_time = Instant::now();
    let config = load_config(args.config.as_ref())?;
    let seeds = parse_seeds(&args.seeds)?;
    let requested = expand_scenarios(&split_csv(&args.scenarios));
    let runner = ScenarioRunner::new(config, args.verbose);

    let mut results = Vec::new();
    for name in &requested {
        let Some(scenario) = get_scenario(name) else {
            println!("{} Unknown scenario: {name}", "⚠️".yellow());
            continue;
        };
        results.extend(runner.run_scenario(&scenario, &seeds, args.iterations));
    }

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut out = open_output(args.output.as_deref())?;
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:25} - {description}")?;
    }
    out.flush()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "📦 Redstone Courier Protocol Tester".bright_cyan().bold());
    println!("{}", "===================================".cyan());
}

fn load_config(path: Option<&PathBuf>) -> Result<ProtocolConfig> {
    let Some(path) = path else {
        return Ok(ProtocolConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ProtocolConfig::from_json(&json)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(input)
        .iter()
        .map(|seed| {
            seed.parse::<u64>()
                .with_context(|| format!("invalid seed: {seed}"))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!seeds.is_empty(), "at least one seed is required");
    Ok(seeds)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut out = open_output(args.output.as_deref())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut out, results)?,
        "markdown" if results.is_empty() => writeln!(
            out,
            "# Redstone Courier Protocol Test Results\n\n_No scenarios executed._"
        )?,
        "markdown" => reports::generate_markdown_report(&mut out, results)?,
        _ => reports::generate_console_report(&mut out, results, start_time.elapsed())?,
    }

    out.flush()?;
    Ok(())
}

/// Buffered report sink: the `--output` file when given, stdout otherwise.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(stdout().lock())));
    };
    let file = File::create(path)
        .with_context(|| format!("cannot write report to {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
