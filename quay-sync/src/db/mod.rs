//! Database module
//!
//! Owns the SQLite connection pool and embedded migrations. Repositories
//! are free functions over the pool, one module per table.

pub mod channels;
pub mod inventory_requests;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::error::SyncError;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database service — owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the ledger database with WAL mode and run migrations
    pub async fn open(db_path: &str) -> Result<Self, SyncError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // busy_timeout: wait out write contention instead of failing fast
        sqlx::query("PRAGMA busy_timeout = 5000;").execute(&pool).await?;

        MIGRATOR.run(&pool).await?;
        tracing::info!("Ledger database ready (SQLite WAL, busy_timeout=5000ms)");

        Ok(Self { pool })
    }

    /// In-memory ledger; used by tests and local experiments.
    ///
    /// A single connection is mandatory — every in-memory connection is its
    /// own database.
    pub async fn open_in_memory() -> Result<Self, SyncError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }
}
