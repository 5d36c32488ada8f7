//! Scoped connection provisioning.
//!
//! Each gateway operation acquires its own short-lived connection to a
//! target and releases it before control returns to the caller. Connections
//! are never pooled or shared across requests.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::debug;

use crate::config::TargetConfig;
use crate::error::{RelayError, Result};

/// Timeout for establishing a connection to a target.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Runs `f` with a connection scoped to the target's parameters.
///
/// The connection is released on every exit path, normal return or failure,
/// before the result is handed back. Establishment failures surface as
/// connection errors with target context; they are never retried.
pub async fn with_connection<T, F, Fut>(target: &TargetConfig, f: F) -> Result<T>
where
    F: FnOnce(PgPool) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let pool = connect(target).await?;
    let result = f(pool.clone()).await;
    pool.close().await;
    result
}

/// Establishes a single-connection pool for the given target.
///
/// Connection parameters are passed as typed options; no connection string
/// is built, so the password cannot leak into logs or error messages.
async fn connect(target: &TargetConfig) -> Result<PgPool> {
    debug!(
        "Connecting to target '{}' ({})",
        target.name,
        target.display_string()
    );

    let options = PgConnectOptions::new()
        .host(&target.host)
        .port(target.port)
        .username(&target.user)
        .password(&target.password)
        .database(&target.database);

    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await
        .map_err(|e| map_connection_error(e, target))
}

/// Maps sqlx connection errors to user-friendly messages with target context.
fn map_connection_error(error: sqlx::Error, target: &TargetConfig) -> RelayError {
    let name = &target.name;
    let host = &target.host;
    let port = target.port;
    let user = &target.user;
    let database = &target.database;

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        RelayError::connection(format!(
            "target '{name}': cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        RelayError::connection(format!(
            "target '{name}': authentication failed for user '{user}'. Check the configured credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        RelayError::connection(format!(
            "target '{name}': database '{database}' does not exist."
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        RelayError::connection(format!(
            "target '{name}': connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        RelayError::connection(format!("target '{name}': {error}"))
    }
}
