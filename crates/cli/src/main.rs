//! fleetalert — alert rule engine CLI.
//!
//! Subcommands:
//! - `validate` — load a rule file and report every violation at once
//! - `run` — stream scored events (JSONL) through the engine, delivering
//!   alerts to a JSONL file/stdout or a webhook
//!
//! Flags fall back to `FLEETALERT_*` environment variables (see
//! `fleetalert_core::Config`), so a deployment can configure everything
//! through the environment and invoke a bare `fleetalert run`.

mod pipeline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use fleetalert_core::{config, Config};
use fleetalert_rules::loader::{self, RuleError};

use pipeline::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "fleetalert", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a rule file and report every violation.
    Validate {
        /// Path to the alert rule YAML file.
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Evaluate a JSONL event stream and deliver alerts.
    Run {
        /// Path to the alert rule YAML file.
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Event stream path, or '-' for stdin.
        #[arg(long, default_value = "-")]
        events: String,

        /// Alert output path, or '-' for stdout.
        #[arg(long, default_value = "-")]
        out: String,

        /// Shard evaluation by device across this many workers.
        #[arg(long)]
        workers: Option<usize>,

        /// Scoring threshold below which events do not count toward bursts.
        #[arg(long)]
        min_score: Option<f64>,

        /// POST alerts to this webhook instead of writing JSONL.
        #[arg(long)]
        webhook: Option<String>,

        /// Delivery attempts per alert before it is surfaced as failed.
        #[arg(long)]
        retry_budget: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Validate { rules } => {
            let path = rules.unwrap_or_else(|| config.engine.rules_path.clone());
            validate(&path)
        }
        Command::Run {
            rules,
            events,
            out,
            workers,
            min_score,
            webhook,
            retry_budget,
        } => {
            config.log_summary();

            let path = rules.unwrap_or_else(|| config.engine.rules_path.clone());
            let catalog = loader::load_rules_file(&path).map_err(report_rule_error)?;

            let options = RunOptions {
                events,
                out,
                workers: workers.unwrap_or(config.engine.workers as usize).max(1),
                min_score: min_score.unwrap_or(config.engine.min_score),
                webhook: webhook.or_else(|| config.sink.webhook_url.clone()),
                retry_budget: retry_budget.unwrap_or(config.sink.retry_budget),
                retry_backoff_ms: config.sink.retry_backoff_ms,
                queue_capacity: config.sink.queue_capacity as usize,
            };

            pipeline::run(Arc::new(catalog), options).await
        }
    }
}

fn validate(path: &Path) -> anyhow::Result<()> {
    match loader::load_rules_file(path) {
        Ok(catalog) => {
            info!(
                path = %path.display(),
                rules = catalog.len(),
                "rule file is valid"
            );
            println!(
                "OK: {} rule(s) ({} burst, {} dominant_family, {} tag_route)",
                catalog.len(),
                catalog.burst_rules().len(),
                catalog.dominant_rules().len(),
                catalog.tag_routes().len(),
            );
            Ok(())
        }
        Err(e) => Err(report_rule_error(e)),
    }
}

/// Print every validation violation before failing; the engine never
/// starts against a partial or invalid catalogue.
fn report_rule_error(err: RuleError) -> anyhow::Error {
    match err {
        RuleError::Invalid(result) => {
            for e in &result.errors {
                eprintln!("error: {}: {}", e.path, e.message);
            }
            anyhow::anyhow!("rule configuration has {} violation(s)", result.errors.len())
        }
        other => anyhow::Error::new(other).context("failed to load rule configuration"),
    }
}
