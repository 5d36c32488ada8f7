//! Single-statement execution with timing and outcome classification.
//!
//! Runs one caller-supplied SQL statement against a target and produces a
//! normalized outcome. Execution is a single attempt: statements are not
//! assumed idempotent, so there is no automatic retry.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::TargetConfig;
use crate::db;
use crate::error::{RelayError, Result};

/// Wall-clock limit for one statement execution.
const STATEMENT_TIMEOUT_SECS: u64 = 120;

/// Normalized result of one statement execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Execution start time (server clock).
    pub started_at: DateTime<Utc>,
    /// Elapsed wall-clock time, measured up to the point of failure if any.
    pub duration: Duration,
    /// Whether the statement ran to completion.
    pub succeeded: bool,
    /// Success summary or error text.
    pub message: String,
}

/// Executes a single statement against the target, measuring elapsed time.
///
/// The statement text is the full command; nothing is parameterized or
/// rewritten. Connection failures and execution failures both classify as a
/// failed outcome, with the error text as the outcome message, so they can
/// be audited like any other attempt.
pub async fn execute(target: &TargetConfig, statement: &str) -> ExecutionOutcome {
    let started_at = Utc::now();
    let start = Instant::now();
    let result = run_statement(target, statement).await;
    let duration = start.elapsed();

    match result {
        Ok(rows_affected) => {
            info!(
                "Statement against '{}' completed in {:?} ({} rows affected)",
                target.name, duration, rows_affected
            );
            ExecutionOutcome {
                started_at,
                duration,
                succeeded: true,
                message: success_message(rows_affected),
            }
        }
        Err(e) => {
            info!(
                "Statement against '{}' failed after {:?}: {}",
                target.name, duration, e
            );
            ExecutionOutcome {
                started_at,
                duration,
                succeeded: false,
                message: e.to_string(),
            }
        }
    }
}

/// Runs the statement on a scoped connection and returns the affected-row count.
async fn run_statement(target: &TargetConfig, statement: &str) -> Result<u64> {
    db::with_connection(target, |pool| async move {
        let result = tokio::time::timeout(
            Duration::from_secs(STATEMENT_TIMEOUT_SECS),
            sqlx::query(statement).execute(&pool),
        )
        .await
        .map_err(|_| {
            RelayError::query(format!(
                "statement timed out after {STATEMENT_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| RelayError::query(format_query_error(e)))?;

        Ok(result.rows_affected())
    })
    .await
}

/// Formats the fixed success summary.
fn success_message(rows_affected: u64) -> String {
    format!("Query executed successfully, {rows_affected} rows affected.")
}

/// Formats an execution error, surfacing server-side detail when available.
fn format_query_error(error: sqlx::Error) -> String {
    if let Some(db_error) = error.as_database_error() {
        let mut result = String::from("ERROR: ");
        result.push_str(db_error.message());

        if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
            if let Some(detail) = pg_error.detail() {
                result.push_str("\n  DETAIL: ");
                result.push_str(detail);
            }
            if let Some(hint) = pg_error.hint() {
                result.push_str("\n  HINT: ");
                result.push_str(hint);
            }
        }

        result
    } else {
        error.to_string()
    }
}
