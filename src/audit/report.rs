//! Date-bounded report reads from the audit store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

use crate::config::{Config, AUDIT_TARGET};
use crate::db;
use crate::error::{RelayError, Result};

/// Placeholder rendered for audit fields absent from storage.
const PLACEHOLDER: &str = "N/A";

/// One audit record projected for display and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date: String,
    pub query_text: String,
    pub submitted_by: String,
    pub approved_by: String,
    pub target_db: String,
    pub execution_time: String,
    pub duration: String,
    pub output: String,
    pub status: String,
}

/// Raw audit row as stored.
#[derive(Debug, Clone, FromRow)]
struct AuditRow {
    execution_time: DateTime<Utc>,
    query_text: String,
    submitted_by: Option<String>,
    approved_by: Option<String>,
    target_db: String,
    execution_duration: Option<String>,
    output: Option<String>,
    status: String,
}

impl From<AuditRow> for ReportRow {
    fn from(row: AuditRow) -> Self {
        let timestamp = row.execution_time.to_rfc3339();
        Self {
            date: timestamp.clone(),
            query_text: row.query_text,
            submitted_by: row.submitted_by.unwrap_or_else(|| PLACEHOLDER.to_string()),
            approved_by: row.approved_by.unwrap_or_else(|| PLACEHOLDER.to_string()),
            target_db: row.target_db,
            execution_time: timestamp,
            duration: row
                .execution_duration
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            output: row.output.unwrap_or_else(|| PLACEHOLDER.to_string()),
            status: row.status,
        }
    }
}

/// Fetches audit records whose timestamp falls within the date range,
/// ascending by timestamp.
///
/// The range is inclusive of the entire end calendar day: the upper bound is
/// the start of the day after `end_date`, so start == end covers that whole
/// day.
pub async fn fetch(config: &Config, start_date: &str, end_date: &str) -> Result<Vec<ReportRow>> {
    let (lower, upper) = parse_range(start_date, end_date)?;

    let audit = config.audit_target().ok_or_else(|| {
        RelayError::report(format!("audit target '{AUDIT_TARGET}' is not configured"))
    })?;

    let rows = db::with_connection(audit, |pool| async move {
        sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT execution_time, query_text, submitted_by, approved_by,
                   target_db, execution_duration, output, status
            FROM submitted_queries
            WHERE execution_time >= $1 AND execution_time < $2
            ORDER BY execution_time ASC
            "#,
        )
        .bind(lower)
        .bind(upper)
        .fetch_all(&pool)
        .await
        .map_err(|e| RelayError::report(format!("failed to fetch report data: {e}")))
    })
    .await
    .map_err(|e| match e {
        RelayError::Report(_) => e,
        other => RelayError::report(format!("failed to read audit store: {other}")),
    })?;

    Ok(rows.into_iter().map(ReportRow::from).collect())
}

/// Computes the half-open timestamp range for an inclusive day-bounded query.
fn parse_range(start_date: &str, end_date: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_date(start_date, "start")?;
    let end = parse_date(end_date, "end")?;

    let upper = end
        .succ_opt()
        .ok_or_else(|| RelayError::report(format!("end date '{end_date}' is out of range")))?;

    Ok((
        start.and_time(NaiveTime::MIN).and_utc(),
        upper.and_time(NaiveTime::MIN).and_utc(),
    ))
}

fn parse_date(text: &str, which: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| RelayError::report(format!("invalid {which} date '{text}': {e}")))
}
