mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use rulebook_analyze::OpenEndedPolicy;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// How the overlap check treats rules without an expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OpenEndedArg {
    /// Skip pairs where either rule lacks a bound
    Skip,
    /// Treat a missing expiration date as "never expires"
    Unbounded,
}

impl From<OpenEndedArg> for OpenEndedPolicy {
    fn from(arg: OpenEndedArg) -> Self {
        match arg {
            OpenEndedArg::Skip => OpenEndedPolicy::Skip,
            OpenEndedArg::Unbounded => OpenEndedPolicy::Unbounded,
        }
    }
}

/// Business-rule toolkit: conflict checks, rule evaluation and pricing simulation.
#[derive(Parser)]
#[command(
    name = "rulebook",
    version,
    about = "Business-rule toolkit: conflict checks, rule evaluation and pricing simulation"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a rulebook.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect conflicts in a rule set (overlaps, dependency cycles, priority ties)
    Check {
        /// Path to the rules JSON file
        rules: PathBuf,
        /// Policy for rules without an expiration date
        #[arg(long, value_enum)]
        open_ended: Option<OpenEndedArg>,
    },

    /// Evaluate a rule set against variable bindings
    Eval {
        /// Path to the rules JSON file
        rules: PathBuf,
        /// Path to the variables JSON file
        #[arg(long)]
        vars: PathBuf,
    },

    /// Run a pricing simulation scenario
    Simulate {
        /// Path to the scenario JSON file ({context, rules, baseRates})
        scenario: PathBuf,
    },

    /// Validate a condition tree
    Validate {
        /// Path to the condition tree JSON file
        tree: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("error: {}", e), cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Check { rules, open_ended } => {
            let mut policy = cfg.conflicts;
            if let Some(arg) = open_ended {
                policy.open_ended = arg.into();
            }
            commands::check::cmd_check(&rules, &policy, cli.output, cli.quiet);
        }
        Commands::Eval { rules, vars } => {
            commands::eval::cmd_eval(&rules, &vars, cli.output, cli.quiet);
        }
        Commands::Simulate { scenario } => {
            commands::simulate::cmd_simulate(&scenario, cfg.simulation, cli.output, cli.quiet);
        }
        Commands::Validate { tree } => {
            commands::validate::cmd_validate(&tree, cli.output, cli.quiet);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read and deserialize a JSON input file, exiting with an error report on
/// failure. `what` names the file in messages ("rules", "scenario", ...).
pub(crate) fn load_json<T: DeserializeOwned>(
    path: &Path,
    what: &str,
    output: OutputFormat,
    quiet: bool,
) -> T {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: {} file not found: {}", what, path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid {} in {}: {}", what, path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Print a pretty JSON document to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", json);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
