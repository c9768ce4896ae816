mod db;
pub mod notifications;
pub mod orders;

use std::{str::FromStr, time::Duration};

pub use db::SqliteDatabase;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};

use crate::db::traits::StoreError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://urbanease.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a connection pool. The database file is created if it does not exist yet, and runs in WAL mode so that
/// readers are never blocked by the single writer.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
