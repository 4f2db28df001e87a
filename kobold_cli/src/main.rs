use anyhow::Context;
use clap::{Parser, Subcommand};
use kobold_common::{ensure_config, load_config, HashMode, ListMode, OptionsOverride};
use kobold_core::{load_expected, load_value, Comparator, MismatchReport, Outcome};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kobold")]
#[command(author = "Kobold Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural comparison of expected and actual documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare an expected document against an actual document
    Compare {
        /// Expected document (JSON or YAML)
        expected: PathBuf,

        /// Actual document (JSON or YAML)
        actual: PathBuf,

        /// Mapping key-set mode: full or existing
        #[arg(long)]
        hash: Option<HashMode>,

        /// Unordered list mode: full or existing
        #[arg(long)]
        list: Option<ListMode>,

        /// Compare lists without regard to order
        #[arg(short, long)]
        unordered: bool,

        /// Mapping key whose value only has to be present (can be specified multiple times)
        #[arg(short = 'k', long = "dontcare-key")]
        dontcare_keys: Vec<String>,

        /// Maximum nesting depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Show the mismatch as a unified diff
        #[arg(long, conflicts_with = "json")]
        unified: bool,

        /// Configuration file to use instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the resolved configuration
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,

        /// Configuration file to use instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

struct CompareArgs {
    expected: PathBuf,
    actual: PathBuf,
    options: OptionsOverride,
    max_depth: Option<usize>,
    json: bool,
    unified: bool,
    config: Option<PathBuf>,
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            expected,
            actual,
            hash,
            list,
            unordered,
            dontcare_keys,
            max_depth,
            json,
            unified,
            config,
        } => {
            let mut options = OptionsOverride {
                hash,
                list,
                ..OptionsOverride::none()
            };
            if unordered {
                options = options.ordered(false);
            }
            if !dontcare_keys.is_empty() {
                options = options.dontcare_keys(dontcare_keys);
            }

            let args = CompareArgs {
                expected,
                actual,
                options,
                max_depth,
                json,
                unified,
                config,
            };
            match run_compare(args) {
                Ok(true) => {}
                Ok(false) => {
                    let _ = std::io::stdout().flush();
                    std::process::exit(2);
                }
                Err(e) => {
                    error!("Compare failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Config { init, config } => {
            if let Err(e) = run_config(init, config.as_deref()) {
                error!("Config failed: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

#[derive(Serialize)]
struct JsonReport {
    expected: String,
    actual: String,
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<serde_json::Value>,
}

/// Returns whether the documents matched.
fn run_compare(args: CompareArgs) -> anyhow::Result<bool> {
    let loaded = load_config(args.config.as_deref()).context("loading configuration")?;
    if loaded.exists {
        info!("Using configuration {}", loaded.path.display());
    }

    let mut comparator = Comparator::from_config(&loaded.config).with_options(&args.options);
    if let Some(max_depth) = args.max_depth {
        comparator = comparator.with_max_depth(max_depth);
    }

    let expected = load_expected(&args.expected)
        .with_context(|| format!("loading expected document {}", args.expected.display()))?;
    let actual = load_value(&args.actual)
        .with_context(|| format!("loading actual document {}", args.actual.display()))?;

    info!("Comparing:");
    info!("  Expected: {}", args.expected.display());
    info!("  Actual:   {}", args.actual.display());

    let outcome = comparator.compare(&expected, &actual)?;
    let matched = outcome.is_match();

    if args.json {
        let report = JsonReport {
            expected: args.expected.display().to_string(),
            actual: args.actual.display().to_string(),
            matched,
            diff: outcome.diff().map(|diff| diff.to_json()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(matched);
    }

    match outcome {
        Outcome::Match => println!("Match"),
        Outcome::Mismatch(diff) => {
            let report = MismatchReport::new(&diff)?;
            if args.unified {
                print!("{}", report.unified());
            } else {
                print!("{}", report.render());
            }
            info!("{} line(s) differ", report.changed_lines());
        }
    }
    Ok(matched)
}

fn run_config(init: bool, path: Option<&Path>) -> anyhow::Result<()> {
    let loaded = if init {
        ensure_config(path)?
    } else {
        load_config(path)?
    };

    if init && !loaded.exists {
        info!("Wrote default configuration to {}", loaded.path.display());
    } else {
        info!(
            "Configuration {} ({})",
            loaded.path.display(),
            if loaded.exists { "found" } else { "defaults" }
        );
    }
    println!("{}", serde_json::to_string_pretty(&loaded.config)?);
    Ok(())
}
