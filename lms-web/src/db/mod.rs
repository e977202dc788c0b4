//! Database access layer for lms-web
//!
//! Query functions take any sqlx executor, so the same call works against
//! the pool or inside a transaction (`&mut *tx`).

use std::future::Future;
use std::time::Duration;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;

pub mod courses;
pub mod enrollments;
pub mod payments;
pub mod progress;
pub mod users;

/// Run a storage operation under a time bound
///
/// A future that is dropped on timeout rolls back any transaction it held,
/// so a timed-out operation leaves no partial writes.
pub async fn bounded<T, E, F>(operation: &str, limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<lms_common::Error>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                limit_ms = limit.as_millis() as u64,
                "Storage operation exceeded time bound"
            );
            Err(E::from(lms_common::Error::Timeout(operation.to_string())))
        }
    }
}

/// Begin a transaction that already holds the database write lock
///
/// A deferred transaction that reads before writing cannot upgrade its
/// snapshot once another writer has committed; SQLite then fails with
/// SQLITE_BUSY instead of waiting. Opening with a no-op write makes
/// contention wait on `busy_timeout`. Services that read then write use
/// this instead of `pool.begin()`.
pub async fn begin_write(pool: &SqlitePool) -> lms_common::Result<Transaction<'static, Sqlite>> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE schema_version SET version = version")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}
