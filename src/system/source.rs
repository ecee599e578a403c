use std::process::Stdio;

use futures::future::BoxFuture;
use tokio::process::Command;

use super::platform;
use crate::error::QueryError;

/// External queries backing the static facts and dynamic metrics.
///
/// Each method returns the raw text the query produced:
/// - `static_facts`: `Label : value` lines for `L1CacheSize`, `L2CacheSize`,
///   `L3CacheSize`, `NumberOfCores`, `NumberOfLogicalProcessors` (any may be missing).
/// - `l1_cache`: a header row followed by one value row, in KB.
/// - `context_switches`: a `CookedValue : <float>` line, sampled over about a second.
/// - `processes`: `Name Id CPU` rows, busiest first.
pub trait TelemetrySource: Send + Sync {
    fn static_facts(&self) -> BoxFuture<'_, Result<String, QueryError>>;
    fn l1_cache(&self) -> BoxFuture<'_, Result<String, QueryError>>;
    fn context_switches(&self) -> BoxFuture<'_, Result<String, QueryError>>;
    fn processes(&self) -> BoxFuture<'_, Result<String, QueryError>>;
}

/// Queries the running host through the platform layer.
#[derive(Debug, Default)]
pub struct OsSource;

impl TelemetrySource for OsSource {
    fn static_facts(&self) -> BoxFuture<'_, Result<String, QueryError>> {
        Box::pin(platform::query_static_facts())
    }

    fn l1_cache(&self) -> BoxFuture<'_, Result<String, QueryError>> {
        Box::pin(platform::query_l1_cache())
    }

    fn context_switches(&self) -> BoxFuture<'_, Result<String, QueryError>> {
        Box::pin(platform::query_context_switches())
    }

    fn processes(&self) -> BoxFuture<'_, Result<String, QueryError>> {
        Box::pin(platform::query_processes())
    }
}

const STDERR_EXCERPT: usize = 200;

/// Runs `program` to completion and returns its stdout.
pub async fn run_command(program: &str, args: &[&str]) -> Result<String, QueryError> {
    tracing::debug!(program, ?args, "running query command");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| QueryError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
        return Err(QueryError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
