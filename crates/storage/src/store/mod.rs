#![forbid(unsafe_code)]

mod collections;
mod entity;
mod error;
mod folders;
mod profiles;
mod records;
mod requests;
mod schema;
mod trees;

pub use error::{RecordKind, StoreError};
pub use folders::CascadeCount;

use crate::{MAX_BUSY_TIMEOUT, RetryPolicy, StoreConfig};
use folio_core::ValidationError;
use entity::Tx;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;

/// SQLite-backed store for connection profiles and the request hierarchy.
///
/// Each handle owns one connection. Several handles may point at the same
/// database file; SQLite serializes their write transactions and the retry
/// policy absorbs short lock contention.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    config: StoreConfig,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(StoreConfig::new(storage_dir))
    }

    pub fn open_with(config: StoreConfig) -> Result<Self, StoreError> {
        if config.busy_timeout > MAX_BUSY_TIMEOUT {
            return Err(ValidationError::new(
                "busy_timeout",
                format!("must be at most {} ms", MAX_BUSY_TIMEOUT.as_millis()),
            )
            .into());
        }
        std::fs::create_dir_all(&config.storage_dir)?;

        let db_path = config.db_path();
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA temp_store=MEMORY;",
        )?;

        config
            .retry
            .run("install_schema", || schema::install_schema(&conn))
            .map_err(|err| err.in_operation("install_schema"))?;
        log::info!("opened store at {}", db_path.display());

        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage_dir(&self) -> &Path {
        &self.config.storage_dir
    }

    pub fn schema_version(&self) -> Result<Option<String>, StoreError> {
        schema::schema_version(&self.conn)
    }

    /// Flushes the WAL into the main database file and closes the connection.
    /// A failed checkpoint is logged, not returned.
    pub fn close(self) -> Result<(), StoreError> {
        if let Err(err) = self
            .conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        {
            log::warn!("wal checkpoint on close failed: {err}");
        }
        self.conn
            .close()
            .map_err(|(_, err)| StoreError::from(err).in_operation("close"))?;
        log::info!("closed store at {}", self.config.db_path().display());
        Ok(())
    }

    /// Runs `op` inside one write transaction (taken eagerly, so concurrent
    /// writers serialize at `BEGIN`). Any error rolls back every write made by
    /// `op`. Contention is retried per the configured policy, re-running `op`
    /// from scratch each time.
    pub(crate) fn run_in_transaction<T>(
        &mut self,
        label: &'static str,
        op: impl FnMut(&Tx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.run_with(label, TransactionBehavior::Immediate, op)
    }

    /// Read-only counterpart of [`Self::run_in_transaction`]: every query in
    /// `op` observes the same committed state.
    pub(crate) fn read<T>(
        &mut self,
        label: &'static str,
        op: impl FnMut(&Tx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.run_with(label, TransactionBehavior::Deferred, op)
    }

    fn run_with<T>(
        &mut self,
        label: &'static str,
        behavior: TransactionBehavior,
        mut op: impl FnMut(&Tx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let retry: RetryPolicy = self.config.retry;
        let conn = &mut self.conn;
        retry
            .run(label, || {
                let tx = Tx::begin(conn, behavior, now_ms())?;
                let value = op(&tx)?;
                tx.commit()?;
                Ok(value)
            })
            .map_err(|err| err.in_operation(label))
    }
}

fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
