//! Append-only audit record writes.

use tracing::debug;

use crate::config::{Config, AUDIT_TARGET};
use crate::db;
use crate::error::{RelayError, Result};
use crate::gateway::ExecutionRequest;
use crate::query::ExecutionOutcome;

/// Audit status of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Executed,
    Failed,
}

impl AuditStatus {
    /// Derives the status from an execution outcome.
    pub fn from_outcome(outcome: &ExecutionOutcome) -> Self {
        if outcome.succeeded {
            Self::Executed
        } else {
            Self::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::Failed => "failed",
        }
    }
}

/// Appends one audit record for a submission.
///
/// Opens its own scoped connection to the audit store, independent of the
/// connection the statement ran on, and is attempted even when the statement
/// failed. Any failure here is an audit error, distinct from the outcome of
/// the query itself.
pub async fn record(
    config: &Config,
    request: &ExecutionRequest,
    target_display_name: &str,
    outcome: &ExecutionOutcome,
) -> Result<()> {
    let audit = config.audit_target().ok_or_else(|| {
        RelayError::audit(format!("audit target '{AUDIT_TARGET}' is not configured"))
    })?;

    let status = AuditStatus::from_outcome(outcome);
    debug!(
        "Recording audit entry for '{}' with status '{}'",
        target_display_name,
        status.as_str()
    );

    db::with_connection(audit, |pool| async move {
        sqlx::query(
            r#"
            INSERT INTO submitted_queries
            (query_text, submitted_by, approved_by, target_db, execution_time, execution_duration, output, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&request.statement)
        .bind(&request.submitted_by)
        .bind(&request.approved_by)
        .bind(target_display_name)
        .bind(outcome.started_at)
        .bind(format!("{:?}", outcome.duration))
        .bind(&outcome.message)
        .bind(status.as_str())
        .execute(&pool)
        .await
        .map_err(|e| RelayError::audit(format!("failed to persist audit record: {e}")))?;

        Ok(())
    })
    .await
    .map_err(|e| match e {
        RelayError::Audit(_) => e,
        other => RelayError::audit(format!("failed to reach audit store: {other}")),
    })
}
