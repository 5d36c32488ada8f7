//! Integration tests for the gateway.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable to run them; the database is used
//! both as a submission target and as the audit store.
//!
//! Run with: `cargo test --test integration_tests`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};

use db_relay::config::{Config, TargetConfig, AUDIT_TARGET};
use db_relay::db;
use db_relay::error::RelayError;
use db_relay::export::REPORT_HEADERS;
use db_relay::gateway::{ExecutionRequest, Gateway};

static MARKER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Builds a marker string unique to this test run, embedded in statement
/// text so assertions survive shared audit-store state.
fn unique_marker(label: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let n = MARKER_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("it-{label}-{nanos}-{n}")
}

fn target_from_env(name: &str) -> Option<TargetConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let parsed = url::Url::parse(&url).ok()?;
    Some(TargetConfig {
        name: name.to_string(),
        host: parsed.host_str()?.to_string(),
        port: parsed.port().unwrap_or(5432),
        database: parsed.path().strip_prefix('/')?.to_string(),
        user: parsed.username().to_string(),
        password: parsed.password().unwrap_or("").to_string(),
    })
}

/// Registry with the audit store and one submission target, both backed by
/// the test database.
fn test_config() -> Option<Config> {
    Some(Config {
        targets: vec![target_from_env(AUDIT_TARGET)?, target_from_env("Primary")?],
    })
}

async fn test_gateway() -> Option<Gateway> {
    let gateway = Gateway::new(test_config()?);
    gateway
        .init_audit_store()
        .await
        .expect("audit store init failed");
    Some(gateway)
}

fn request(target_name: &str, statement: &str) -> ExecutionRequest {
    ExecutionRequest {
        statement: statement.to_string(),
        submitted_by: "alice".to_string(),
        approved_by: "bob".to_string(),
        target_name: target_name.to_string(),
    }
}

/// Parses a CSV report into its data records.
fn report_records(bytes: &[u8]) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_reader(bytes);
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        REPORT_HEADERS.to_vec()
    );
    reader
        .records()
        .collect::<Result<_, _>>()
        .expect("report CSV did not parse")
}

/// Report window that safely covers records written "now".
fn today_window() -> (String, String) {
    let today = Utc::now().date_naive();
    let start = today.pred_opt().unwrap().format("%Y-%m-%d").to_string();
    let end = today.succ_opt().unwrap().format("%Y-%m-%d").to_string();
    (start, end)
}

#[tokio::test]
async fn test_successful_submission_creates_one_audit_record() {
    let Some(gateway) = test_gateway().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let marker = unique_marker("success");
    let statement = format!("SELECT 1 -- {marker}");

    let message = gateway.submit(request("Primary", &statement)).await.unwrap();
    assert_eq!(message, "Query executed and logged successfully.");

    let (start, end) = today_window();
    let bytes = gateway.report(&start, &end).await.unwrap();
    let matching: Vec<_> = report_records(&bytes)
        .into_iter()
        .filter(|r| r[1].contains(&marker))
        .collect();

    assert_eq!(matching.len(), 1);
    let record = &matching[0];
    assert_eq!(&record[2], "alice");
    assert_eq!(&record[3], "bob");
    assert_eq!(&record[4], "Primary");
    assert_eq!(&record[8], "executed");
    assert!(record[7].contains("rows affected"));
    // Duration is always recorded.
    assert!(!record[6].is_empty());
    assert_ne!(&record[6], "N/A");
}

#[tokio::test]
async fn test_failed_statement_is_still_audited() {
    let Some(gateway) = test_gateway().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let marker = unique_marker("failure");
    let statement = format!("SELECT * FROM nonexistent_table_xyz -- {marker}");

    // Execution failure is an audited outcome, not a submission error.
    let message = gateway.submit(request("Primary", &statement)).await.unwrap();
    assert_eq!(message, "Query executed and logged successfully.");

    let (start, end) = today_window();
    let bytes = gateway.report(&start, &end).await.unwrap();
    let matching: Vec<_> = report_records(&bytes)
        .into_iter()
        .filter(|r| r[1].contains(&marker))
        .collect();

    assert_eq!(matching.len(), 1);
    let record = &matching[0];
    assert_eq!(&record[8], "failed");
    assert!(record[7].contains("nonexistent_table_xyz") || record[7].contains("does not exist"));
    // Duration is present even when the statement failed.
    assert!(!record[6].is_empty());
    assert_ne!(&record[6], "N/A");
}

#[tokio::test]
async fn test_unknown_target_leaves_no_audit_record() {
    let Some(gateway) = test_gateway().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let marker = unique_marker("unknown-target");
    let statement = format!("SELECT 1 -- {marker}");

    let error = gateway
        .submit(request("Ghost Target", &statement))
        .await
        .unwrap_err();
    assert!(matches!(error, RelayError::Config(_)));
    assert!(error.to_string().contains("Ghost Target"));

    let (start, end) = today_window();
    let bytes = gateway.report(&start, &end).await.unwrap();
    assert!(report_records(&bytes)
        .iter()
        .all(|r| !r[1].contains(&marker)));
}

#[tokio::test]
async fn test_missing_audit_target_is_audit_error_despite_query_success() {
    let Some(primary) = target_from_env("Primary") else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Registry without the designated audit store entry.
    let gateway = Gateway::new(Config {
        targets: vec![primary],
    });

    let error = gateway
        .submit(request("Primary", "SELECT 1"))
        .await
        .unwrap_err();

    assert!(matches!(error, RelayError::Audit(_)));
    assert!(!matches!(error, RelayError::Query(_)));
    assert!(error.to_string().contains(AUDIT_TARGET));
}

#[tokio::test]
async fn test_report_range_includes_full_end_day_in_ascending_order() {
    let Some(gateway) = test_gateway().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let morning_marker = unique_marker("morning");
    let evening_marker = unique_marker("evening");

    // Seed records at fixed timestamps on a day no submission test writes to.
    let audit = gateway.config().audit_target().unwrap();
    let seeds = [
        (
            Utc.with_ymd_and_hms(2003, 7, 14, 23, 59, 0).unwrap(),
            format!("SELECT 'late' -- {evening_marker}"),
        ),
        (
            Utc.with_ymd_and_hms(2003, 7, 14, 8, 0, 0).unwrap(),
            format!("SELECT 'early' -- {morning_marker}"),
        ),
    ];
    db::with_connection(audit, |pool| async move {
        for (at, text) in &seeds {
            sqlx::query(
                "INSERT INTO submitted_queries \
                 (query_text, target_db, execution_time, status) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(text)
            .bind("Primary")
            .bind(at)
            .bind("executed")
            .execute(&pool)
            .await
            .map_err(|e| RelayError::audit(e.to_string()))?;
        }
        Ok(())
    })
    .await
    .unwrap();

    // start == end covers the entire end day, including 23:59.
    let bytes = gateway.report("2003-07-14", "2003-07-14").await.unwrap();
    let records = report_records(&bytes);
    let morning_pos = records.iter().position(|r| r[1].contains(&morning_marker));
    let evening_pos = records.iter().position(|r| r[1].contains(&evening_marker));

    assert!(morning_pos.is_some());
    assert!(evening_pos.is_some());
    // Ascending by timestamp: 08:00 before 23:59.
    assert!(morning_pos.unwrap() < evening_pos.unwrap());

    // The day before the seeded day matches nothing.
    let bytes = gateway.report("2003-07-13", "2003-07-13").await.unwrap();
    assert!(report_records(&bytes)
        .iter()
        .all(|r| !r[1].contains(&morning_marker) && !r[1].contains(&evening_marker)));
}

#[tokio::test]
async fn test_seeded_null_fields_render_placeholders() {
    let Some(gateway) = test_gateway().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Rows written before this gateway existed may lack optional fields.
    let marker = unique_marker("nulls");
    let text = format!("VACUUM -- {marker}");
    let audit = gateway.config().audit_target().unwrap();
    db::with_connection(audit, |pool| async move {
        sqlx::query(
            "INSERT INTO submitted_queries \
             (query_text, target_db, execution_time, status) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&text)
        .bind("Primary")
        .bind(Utc.with_ymd_and_hms(2003, 9, 2, 12, 0, 0).unwrap())
        .bind("failed")
        .execute(&pool)
        .await
        .map_err(|e| RelayError::audit(e.to_string()))?;
        Ok(())
    })
    .await
    .unwrap();

    let bytes = gateway.report("2003-09-02", "2003-09-02").await.unwrap();
    let records = report_records(&bytes);
    let record = records
        .iter()
        .find(|r| r[1].contains(&marker))
        .expect("seeded record not in report");

    assert_eq!(&record[2], "N/A");
    assert_eq!(&record[3], "N/A");
    assert_eq!(&record[6], "N/A");
    assert_eq!(&record[7], "N/A");
    assert_eq!(&record[8], "failed");
}

#[tokio::test]
async fn test_empty_range_report_is_header_only() {
    let Some(gateway) = test_gateway().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // A range no test seeds and no live submission can reach.
    let bytes = gateway.report("1999-01-01", "1999-01-02").await.unwrap();
    let records = report_records(&bytes);

    assert!(records.is_empty());
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 1);
}

#[tokio::test]
async fn test_concurrent_submissions_are_independent() {
    let Some(mut config) = test_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    config.targets.push(TargetConfig {
        name: "Unreachable".to_string(),
        host: "nonexistent.invalid.host".to_string(),
        port: 5432,
        database: "nowhere".to_string(),
        user: "nobody".to_string(),
        password: "nothing".to_string(),
    });
    let gateway = Gateway::new(config);
    gateway.init_audit_store().await.unwrap();

    let ok_marker = unique_marker("concurrent-ok");
    let bad_marker = unique_marker("concurrent-bad");

    let (ok_result, bad_result) = tokio::join!(
        gateway.submit(request("Primary", &format!("SELECT 1 -- {ok_marker}"))),
        gateway.submit(request("Unreachable", &format!("SELECT 1 -- {bad_marker}"))),
    );

    // One target's connection failure does not affect the other's execution;
    // both submissions are audited.
    ok_result.unwrap();
    bad_result.unwrap();

    let (start, end) = today_window();
    let bytes = gateway.report(&start, &end).await.unwrap();
    let records = report_records(&bytes);

    let ok_record = records.iter().find(|r| r[1].contains(&ok_marker)).unwrap();
    assert_eq!(&ok_record[8], "executed");

    let bad_record = records.iter().find(|r| r[1].contains(&bad_marker)).unwrap();
    assert_eq!(&bad_record[8], "failed");
    assert!(bad_record[7].starts_with("Connection error:"));
}
