//! Command-line runner for the Muzz UI scenarios.
//!
//! Runs the login and profile scenarios against the on-device automation
//! agent, or against the in-process simulation of the app.
//!
//! # Usage
//!
//! ```bash
//! # List every registered scenario
//! muzz-qa list
//!
//! # Only the login scenarios
//! muzz-qa list --feature login
//!
//! # Run the whole suite against the agent on the default host/port
//! muzz-qa run
//!
//! # Run against an agent elsewhere
//! muzz-qa --host 10.0.0.7 --port 9800 run --feature profiles
//!
//! # Run against the simulated app, with a network error on first load
//! muzz-qa run --simulated --network-error
//!
//! # Scenarios whose names contain "login_fails", as JSON
//! muzz-qa -f json run --simulated --filter login_fails
//!
//! # Write the settings file, pointing at a forwarded agent port
//! muzz-qa --port 9801 init
//! ```
//!
//! Exit status is 0 when every selected scenario passes, 1 when any fails,
//! 2 when the agent cannot be reached and 3 when the config file cannot be
//! read, parsed or written.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use muzz_qa_core::config::{ConfigError, SuiteConfig};
use muzz_qa_core::harness::{
    select, AgentLauncher, AppLauncher, Feature, ScenarioHarness, SimulatedLauncher, SuiteReport,
};
use muzz_qa_core::report::ConsoleReporter;
use muzz_qa_core::scenarios;
use muzz_qa_core::simulated::SimulatedOptions;
use tracing_subscriber::EnvFilter;

/// Runner for the Muzz dating-app UI scenarios.
#[derive(Parser)]
#[command(name = "muzz-qa")]
#[command(about = "Run the Muzz login and profile UI scenarios")]
#[command(version)]
struct Cli {
    /// Automation agent host (overrides the config file)
    #[arg(long, global = true, env = "MUZZ_QA_HOST")]
    host: Option<String>,

    /// Automation agent port (overrides the config file)
    #[arg(long, global = true, env = "MUZZ_QA_PORT")]
    port: Option<u16>,

    /// Suite config file (defaults to ~/.muzz-qa/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List registered scenarios
    List {
        /// Only scenarios for this feature (login, profiles)
        #[arg(long)]
        feature: Option<Feature>,
    },

    /// Write the effective settings to the config file
    Init,

    /// Run scenarios and report the verdicts
    Run {
        /// Only scenarios for this feature (login, profiles)
        #[arg(long)]
        feature: Option<Feature>,

        /// Only scenarios whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Drive the in-process simulated app instead of the agent
        #[arg(long)]
        simulated: bool,

        /// Number of profiles in the simulated feed
        #[arg(long, requires = "simulated")]
        profiles: Option<usize>,

        /// Fail the simulated feed's first load with a network error
        #[arg(long, requires = "simulated")]
        network_error: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    ScenariosFailed(usize),
    Connection(String),
    Config(ConfigError),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ScenariosFailed(_) => ExitCode::from(1),
            CliError::Connection(_) => ExitCode::from(2),
            CliError::Config(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::ScenariosFailed(n) => write!(f, "{} scenario(s) failed", n),
            CliError::Connection(msg) => write!(f, "Connection error: {}", msg),
            CliError::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

fn load_config(cli: &Cli) -> Result<SuiteConfig, CliError> {
    let config = match &cli.config {
        Some(path) => SuiteConfig::load_from(path).map_err(CliError::Config)?,
        None => SuiteConfig::load(),
    };
    Ok(apply_overrides(cli, config))
}

fn apply_overrides(cli: &Cli, mut config: SuiteConfig) -> SuiteConfig {
    if let Some(host) = &cli.host {
        config.agent_host = host.clone();
    }
    if let Some(port) = cli.port {
        config.agent_port = port;
    }
    config
}

/// Writes defaults (or the existing home config) plus any `--host`/`--port`
/// overrides. An explicit `--config` path is overwritten, not merged.
fn init(cli: &Cli) -> Result<(), CliError> {
    let written = match &cli.config {
        Some(path) => {
            let config = apply_overrides(cli, SuiteConfig::default());
            config.save_to(path).map_err(CliError::Config)?;
            path.clone()
        }
        None => apply_overrides(cli, SuiteConfig::load())
            .save()
            .map_err(CliError::Config)?,
    };
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "path": written })),
        OutputFormat::Text => println!("Wrote {}", written.display()),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::List { feature } => {
            list(*feature, cli.format);
            Ok(())
        }
        Command::Init => init(&cli),
        Command::Run {
            feature,
            filter,
            simulated,
            profiles,
            network_error,
        } => {
            let config = load_config(&cli)?;

            let launcher: Arc<dyn AppLauncher> = if *simulated {
                let mut options = SimulatedOptions::default().with_network_error(*network_error);
                if let Some(count) = profiles {
                    options = options.with_profile_count(*count);
                }
                Arc::new(SimulatedLauncher::new(options))
            } else {
                Arc::new(AgentLauncher::new(
                    config.agent_host.clone(),
                    config.agent_port,
                ))
            };

            let selected = select(&scenarios::all(), *feature, filter.as_deref());
            if selected.is_empty() {
                eprintln!("No scenarios match the given feature/filter");
                return Ok(());
            }

            let reporter = match cli.format {
                OutputFormat::Text => ConsoleReporter::new(),
                OutputFormat::Json => ConsoleReporter::quiet(),
            };
            let harness = ScenarioHarness::new(launcher, Arc::new(reporter), config);
            harness
                .prepare()
                .await
                .map_err(|e| CliError::Connection(e.to_string()))?;

            let report = harness.run_all(&selected).await;
            print_report(&report, cli.format);

            if report.all_passed() {
                Ok(())
            } else {
                Err(CliError::ScenariosFailed(report.failed()))
            }
        }
    }
}

fn list(feature: Option<Feature>, format: OutputFormat) {
    let selected = select(&scenarios::all(), feature, None);
    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = selected
                .iter()
                .map(|s| serde_json::json!({ "name": s.name, "feature": s.feature }))
                .collect();
            println!("{}", serde_json::Value::Array(entries));
        }
        OutputFormat::Text => {
            for scenario in &selected {
                println!("{:<10} {}", scenario.feature.as_str(), scenario.name);
            }
        }
    }
}

fn print_report(report: &SuiteReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize report: {}", e),
        },
        OutputFormat::Text => {
            println!();
            for scenario in &report.scenarios {
                let mark = if scenario.passed() { "✓" } else { "✗" };
                match &scenario.error {
                    Some(error) => println!(
                        "{} {} ({}ms): {}",
                        mark, scenario.name, scenario.duration_ms, error
                    ),
                    None => println!("{} {} ({}ms)", mark, scenario.name, scenario.duration_ms),
                }
            }
            println!(
                "\n{} passed, {} failed ({} total)",
                report.passed(),
                report.failed(),
                report.scenarios.len()
            );
        }
    }
}
