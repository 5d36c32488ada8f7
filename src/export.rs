//! CSV serialization of report rows.

use crate::audit::ReportRow;
use crate::error::{RelayError, Result};

/// Fixed column order of the exported report.
pub const REPORT_HEADERS: [&str; 9] = [
    "Date",
    "Query Text",
    "Submitted By",
    "Approved By",
    "Target DB",
    "Execution Time",
    "Duration",
    "Output",
    "Status",
];

/// Suggested filename for the exported report.
pub const REPORT_FILENAME: &str = "Report.csv";

/// Content type of the exported report.
pub const REPORT_CONTENT_TYPE: &str = "text/csv";

/// Serializes report rows as CSV bytes.
///
/// The header row is always emitted, even for an empty input sequence.
/// Quoting follows RFC 4180: fields containing the delimiter, quotes, or
/// line breaks are quoted by the writer.
pub fn serialize(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(REPORT_HEADERS)
        .map_err(|e| RelayError::report(format!("failed to write report header: {e}")))?;

    for row in rows {
        writer
            .write_record([
                &row.date,
                &row.query_text,
                &row.submitted_by,
                &row.approved_by,
                &row.target_db,
                &row.execution_time,
                &row.duration,
                &row.output,
                &row.status,
            ])
            .map_err(|e| RelayError::report(format!("failed to write report row: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| RelayError::report(format!("failed to flush report: {e}")))
}
