//! Core gateway façade.
//!
//! The entry point the presentation layer calls into: submit a statement
//! for execution-and-audit, or pull a date-bounded CSV report. Holds the
//! loaded target registry and wires the components together.

use tracing::{info, warn};

use crate::audit;
use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::export;
use crate::query;

/// One operator submission, consumed once.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Full SQL statement text.
    pub statement: String,
    /// Operator who submitted the statement.
    pub submitted_by: String,
    /// Operator who approved the statement.
    pub approved_by: String,
    /// Name of the target to run against.
    pub target_name: String,
}

/// The gateway core, constructed once over the loaded registry.
pub struct Gateway {
    config: Config,
}

impl Gateway {
    /// Creates a gateway over an already-loaded target registry.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes a submission and appends its audit record.
    ///
    /// An unknown target name fails before any connection is attempted and
    /// leaves no audit record. Execution failures are still audited with
    /// status "failed"; only a failure to write the audit record itself
    /// turns into an error here.
    pub async fn submit(&self, request: ExecutionRequest) -> Result<String> {
        let target = self.config.lookup(&request.target_name).ok_or_else(|| {
            RelayError::config(format!(
                "target '{}' is not configured",
                request.target_name
            ))
        })?;

        info!(
            "Submission by '{}' (approved by '{}') against target '{}'",
            request.submitted_by, request.approved_by, target.name
        );

        let outcome = query::execute(target, &request.statement).await;
        if !outcome.succeeded {
            warn!("Statement against '{}' failed; auditing outcome", target.name);
        }

        let target_name = target.name.clone();
        audit::record(&self.config, &request, &target_name, &outcome).await?;

        Ok("Query executed and logged successfully.".to_string())
    }

    /// Produces the CSV report for an inclusive date range.
    pub async fn report(&self, start_date: &str, end_date: &str) -> Result<Vec<u8>> {
        let rows = audit::fetch(&self.config, start_date, end_date).await?;
        info!(
            "Report for {start_date}..{end_date} contains {} records",
            rows.len()
        );
        export::serialize(&rows)
    }

    /// Provisions the audit store schema.
    pub async fn init_audit_store(&self) -> Result<()> {
        audit::ensure_schema(&self.config).await
    }

    /// Returns the loaded registry.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
