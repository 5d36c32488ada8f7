//! Audit trail for executed statements.
//!
//! Every submission appends exactly one record to the `submitted_queries`
//! table in the designated audit store, whether the statement succeeded or
//! failed. The report path reads those records back by date range.

mod recorder;
mod report;

pub use recorder::{record, AuditStatus};
pub use report::{fetch, ReportRow};

use tracing::info;

use crate::config::{Config, AUDIT_TARGET};
use crate::db;
use crate::error::{RelayError, Result};

/// Creates the audit store schema if it does not exist.
///
/// Safe to run repeatedly; used by the `init` subcommand to provision a
/// fresh audit store.
pub async fn ensure_schema(config: &Config) -> Result<()> {
    let audit = config.audit_target().ok_or_else(|| {
        RelayError::audit(format!("audit target '{AUDIT_TARGET}' is not configured"))
    })?;

    db::with_connection(audit, |pool| async move {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submitted_queries (
                id BIGSERIAL PRIMARY KEY,
                query_text TEXT NOT NULL,
                submitted_by TEXT,
                approved_by TEXT,
                target_db TEXT NOT NULL,
                execution_time TIMESTAMPTZ NOT NULL,
                execution_duration TEXT,
                output TEXT,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| {
            RelayError::audit(format!("failed to create submitted_queries table: {e}"))
        })?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_submitted_queries_execution_time
            ON submitted_queries(execution_time)
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RelayError::audit(format!("failed to create audit index: {e}")))?;

        Ok(())
    })
    .await
    .map_err(|e| match e {
        RelayError::Audit(_) => e,
        other => RelayError::audit(format!("failed to reach audit store: {other}")),
    })?;

    info!("Audit store schema is in place");
    Ok(())
}
