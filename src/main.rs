//! Packing Feasibility Checker
//!
//! Runs the built-in scenario catalogue against the decision pipeline, or
//! checks a single load given on the command line.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::fmt::SubscriberBuilder;

use boxfit::{decide, Config, Cuboid, Decision, Scenario, Verdict, SCENARIOS};

/// Decides whether boxes fit into a container.
#[derive(Parser)]
#[command(name = "boxfit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every deciding stage.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run every catalogued scenario and compare with the expected answer.
    Scenarios {
        /// Time budget for each exact search, in milliseconds.
        #[arg(long)]
        time_budget_ms: Option<u64>,
    },
    /// Check one load, e.g. `check --container 5x5x1 --item 3x2x1 --item 3x2x1`.
    Check {
        #[arg(long)]
        container: Cuboid,
        /// An item as WIDTHxHEIGHTxLENGTH; repeat for more.
        #[arg(long = "item", required = true)]
        items: Vec<Cuboid>,
        /// Time budget for the exact search, in milliseconds.
        #[arg(long)]
        time_budget_ms: Option<u64>,
    },
    /// List the catalogued scenarios without solving them.
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Command::Scenarios { time_budget_ms }) => run_scenarios(time_budget_ms),
        Some(Command::Check {
            container,
            items,
            time_budget_ms,
        }) => run_check(&container, &items, time_budget_ms),
        Some(Command::List) => {
            print!("{}", format_catalogue(SCENARIOS));
            Ok(())
        }
        // default: run the catalogue
        None => run_scenarios(None),
    }
}

fn config(time_budget_ms: Option<u64>) -> Config {
    match time_budget_ms {
        Some(ms) => Config::new().with_time_budget(Duration::from_millis(ms)),
        None => Config::new(),
    }
}

/// Decides every scenario; fails if any answer differs from the expected one.
fn run_scenarios(time_budget_ms: Option<u64>) -> Result<()> {
    let config = config(time_budget_ms);
    let mut mismatches = 0;

    for scenario in SCENARIOS {
        let container = scenario.container()?;
        let items = scenario.items()?;

        let started = Instant::now();
        let decision = decide(&container, &items, &config)?;
        let elapsed = started.elapsed();

        if (decision.verdict == Verdict::Fits) != scenario.expected {
            mismatches += 1;
        }
        println!("{}", scenario_line(scenario, &decision, elapsed));
    }

    info!(scenarios = SCENARIOS.len(), mismatches, "catalogue finished");
    if mismatches > 0 {
        bail!("{mismatches} scenario(s) did not match the expected answer");
    }
    Ok(())
}

fn run_check(container: &Cuboid, items: &[Cuboid], time_budget_ms: Option<u64>) -> Result<()> {
    let started = Instant::now();
    let decision = decide(container, items, &config(time_budget_ms))?;
    println!(
        "{} items in {container}: {decision} in {:.2} ms",
        items.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

/// One report line: name, verdict, stage, expectation, status and timing.
fn scenario_line(scenario: &Scenario, decision: &Decision, elapsed: Duration) -> String {
    let fits = decision.verdict == Verdict::Fits;
    let status = if fits == scenario.expected { "OK" } else { "MISMATCH" };
    format!(
        "{:<22} {:<13} {:<15} expected {:<5} {:<8} {:>9.2} ms",
        scenario.name,
        decision.verdict.to_string(),
        decision.stage.to_string(),
        scenario.expected,
        status,
        elapsed.as_secs_f64() * 1000.0
    )
}

fn format_catalogue(scenarios: &[Scenario]) -> String {
    let mut output = String::new();
    for scenario in scenarios {
        let [w, h, l] = scenario.container;
        output.push_str(&format!(
            "{:<22} {:<10} {}\n",
            scenario.name,
            format!("{w}x{h}x{l}"),
            scenario.describe_items()
        ));
    }
    output
}
