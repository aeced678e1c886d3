//! Workunit CLI - run a demo chain of units of work.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use workunit_codec::{CodecError, JsonSerializer};
use workunit_core::{BoxUnit, UnitOfWork, Work, WorkError};
use workunit_operators::{Retry, RetryPolicy, UnitOfWorkExt};

#[derive(Parser)]
#[command(name = "workunit")]
#[command(about = "Composable units of asynchronous work", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated job through map, map_err, timeout and encode
    Run {
        /// How long the simulated job takes
        #[arg(long, default_value = "100")]
        work_ms: u64,
        /// Deadline for each attempt (zero or negative fires immediately)
        #[arg(long, default_value = "1000", allow_negative_numbers = true)]
        timeout_ms: i64,
        /// Make the job fail
        #[arg(long)]
        fail: bool,
        /// Total attempts, overriding the policy file
        #[arg(long)]
        retries: Option<u32>,
        /// Retry policy as a JSON file
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the default retry policy as JSON
    Policy,
}

/// Errors raised by the demo chain.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
enum DemoError {
    #[error("job failed: {0}")]
    Job(String),

    #[error("encoding failed: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Serialize)]
struct Report {
    attempt: u32,
    work_ms: u64,
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            work_ms,
            timeout_ms,
            fail,
            retries,
            policy,
            pretty,
        } => {
            let mut policy = match policy {
                Some(path) => load_policy(&path)?,
                None => RetryPolicy::new().with_max_attempts(1),
            };
            if let Some(attempts) = retries {
                policy = policy.with_max_attempts(attempts);
            }

            let unit = build_chain(policy, work_ms, timeout_ms, fail, pretty);
            info!("Running unit {} with up to {} attempt(s)", unit.id(), policy.attempts());

            let start = Instant::now();
            let outcome = tokio::select! {
                outcome = unit.result() => outcome,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted, cancelling unit {}", unit.id());
                    unit.cancel();
                    unit.result().await
                }
            };

            match outcome {
                Ok(bytes) => {
                    info!("Finished in {:?}", start.elapsed());
                    println!("{}", String::from_utf8_lossy(&bytes));
                }
                Err(e) => return Err(anyhow!("run ended with {}: {}", e.as_label(), e)),
            }
        }
        Commands::Policy => {
            let json = serde_json::to_string_pretty(&RetryPolicy::default())?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn load_policy(path: &Path) -> Result<RetryPolicy> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading policy {}", path.display()))?;
    let policy = serde_json::from_str(&raw)
        .with_context(|| format!("parsing policy {}", path.display()))?;
    Ok(policy)
}

/// job → map → map_err → timeout → encode, rebuilt for every attempt.
fn build_chain(
    policy: RetryPolicy,
    work_ms: u64,
    timeout_ms: i64,
    fail: bool,
    pretty: bool,
) -> BoxUnit<Vec<u8>, DemoError> {
    let serializer = if pretty {
        JsonSerializer::new().pretty()
    } else {
        JsonSerializer::new()
    };
    let attempts = AtomicU32::new(0);

    Retry::new(policy, move || {
        let current = attempts.fetch_add(1, Ordering::Relaxed) + 1;

        simulated_job(work_ms, fail)
            .map(move |message| Report {
                attempt: current,
                work_ms,
                message,
            })
            .map_err(DemoError::Job)
            .timeout_millis(timeout_ms)
            .encode(serializer)
    })
    .boxed()
}

fn simulated_job(work_ms: u64, fail: bool) -> Work<String, String> {
    Work::named("simulated_job", move |token| async move {
        tokio::select! {
            _ = token.cancelled() => Err(WorkError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(work_ms)) => {
                if fail {
                    Err(WorkError::Failed(format!("gave up after {}ms", work_ms)))
                } else {
                    Ok(format!("worked for {}ms", work_ms))
                }
            }
        }
    })
}
