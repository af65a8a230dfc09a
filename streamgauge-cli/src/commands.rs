//! CLI command implementations

use anyhow::{Context, bail};
use clap::Subcommand;
use streamgauge_core::StreamgaugeConfig;
use streamgauge_sim::{QoeReport, ScenarioRunner, scenarios};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a single scenario and print its QoE report
    Run {
        /// Scenario name (see `list`)
        #[arg(short = 'c', long, default_value = "moderate")]
        scenario: String,
        /// Number of simulation steps
        #[arg(short, long, default_value = "300")]
        steps: usize,
        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Override the scenario's mean bandwidth in Mbit/s
        #[arg(long)]
        base_bandwidth: Option<f64>,
        /// Override the scenario's per-step congestion onset probability
        #[arg(long)]
        onset_probability: Option<f64>,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run every built-in scenario and print a comparison table
    Compare {
        /// Number of simulation steps per scenario
        #[arg(short, long, default_value = "300")]
        steps: usize,
        /// Random seed shared by all scenarios
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// List the built-in scenarios
    List,
}

/// Handle the CLI command
///
/// # Errors
/// Returns an error when the scenario is unknown, its configuration is
/// invalid, or report serialization fails.
pub fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            scenario,
            steps,
            seed,
            base_bandwidth,
            onset_probability,
            json,
        } => {
            let overrides = Overrides {
                base_bandwidth,
                onset_probability,
            };
            run_scenario(&scenario, steps, seed, overrides, json)
        }
        Commands::Compare { steps, seed } => compare_scenarios(steps, seed),
        Commands::List => {
            list_scenarios();
            Ok(())
        }
    }
}

/// Command-line overrides applied on top of a named scenario.
struct Overrides {
    base_bandwidth: Option<f64>,
    onset_probability: Option<f64>,
}

impl Overrides {
    fn apply(&self, config: &mut StreamgaugeConfig) {
        if let Some(bandwidth) = self.base_bandwidth {
            config.network.base_bandwidth_mbps = bandwidth;
        }
        if let Some(probability) = self.onset_probability {
            config.network.onset_probability = probability;
        }
    }
}

fn run_scenario(
    name: &str,
    steps: usize,
    seed: u64,
    overrides: Overrides,
    json: bool,
) -> anyhow::Result<()> {
    let Some(mut scenario) = scenarios::by_name(name) else {
        bail!("unknown scenario '{name}', try `streamgauge list`");
    };
    overrides.apply(&mut scenario.config);

    let run = scenario
        .run(seed, steps)
        .with_context(|| format!("scenario '{name}' failed validation"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run.report)?);
    } else {
        print_report(name, &run.report);
    }
    Ok(())
}

fn compare_scenarios(steps: usize, seed: u64) -> anyhow::Result<()> {
    let outcomes = ScenarioRunner::new(seed, steps)
        .run_all()
        .context("built-in scenario failed validation")?;

    println!(
        "{:<12} {:>7} {:>10} {:>8} {:>8} {:>8}",
        "scenario", "stalls", "switches", "jerk", "sync", "QoE"
    );
    for outcome in outcomes {
        println!(
            "{:<12} {:>7} {:>10} {:>8.2} {:>8.2} {:>8.2}",
            outcome.name,
            outcome.report.stall_count,
            outcome.report.switch_count,
            outcome.report.jerkiness_score,
            outcome.report.sync_score,
            outcome.report.overall_qoe
        );
    }
    Ok(())
}

fn list_scenarios() {
    for scenario in scenarios::all() {
        println!("{}", scenario.name);
    }
}

fn print_report(scenario: &str, report: &QoeReport) {
    let sep = "-".repeat(52);
    println!("{sep}");
    println!(" Streamgauge QoE Report - scenario: {scenario}");
    println!("{sep}");

    let rows: [(&str, String); 13] = [
        ("Total steps", format!("{}", report.total_steps)),
        ("Stall events", format!("{}", report.stall_count)),
        ("Stall ratio", format!("{:.3}", report.stall_ratio)),
        (
            "Dropped-frame ratio",
            format!("{:.3}", report.dropped_frame_ratio),
        ),
        (
            "Mean A/V sync drift (ms)",
            format!("{:.2}", report.mean_drift_ms),
        ),
        (
            "Max A/V sync drift (ms)",
            format!("{:.2}", report.max_drift_ms),
        ),
        (
            "A/V out-of-sync ratio",
            format!("{:.3}", report.out_of_sync_ratio),
        ),
        ("Quality switches", format!("{}", report.switch_count)),
        (
            "Mean buffer level (s)",
            format!("{:.2}", report.mean_buffer_level_s),
        ),
        (
            "Jerkiness score     (0-10)",
            format!("{:.2}", report.jerkiness_score),
        ),
        (
            "A/V sync score      (0-10)",
            format!("{:.2}", report.sync_score),
        ),
        (
            "Quality stability   (0-10)",
            format!("{:.2}", report.stability_score),
        ),
        (
            "Overall QoE         (0-10)",
            format!("{:.2}", report.overall_qoe),
        ),
    ];
    for (label, value) in rows {
        println!("  {label:<36} {value}");
    }
    println!("{sep}");
}
