//! Shared, transactional storage handle.
//!
//! # Responsibility
//! - Own the single SQLite connection used by every survey service.
//! - Run each unit of work inside one transaction.
//!
//! # Invariants
//! - At most one transaction is active at a time; callers are serialized by
//!   the connection mutex.
//! - `write` uses IMMEDIATE transactions so check-then-write sequences cannot
//!   race with writers from other processes sharing the same file.
//! - A closure returning `Err` rolls its transaction back.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle over one migrated SQLite connection.
///
/// Clones share the same connection; the handle is `Send + Sync` and can be
/// used from concurrently running request handlers.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens (and migrates) a file-backed database.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::from_connection)
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::from_connection)
    }

    /// Runs `work` inside an IMMEDIATE transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back
    /// otherwise.
    pub fn write<T, E>(&self, work: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        self.run(TransactionBehavior::Immediate, work)
    }

    /// Runs `work` inside a DEFERRED transaction, giving it a consistent
    /// snapshot of committed state.
    pub fn read<T, E>(&self, work: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        self.run(TransactionBehavior::Deferred, work)
    }

    /// Closes the underlying connection.
    ///
    /// Fails with [`DbError::HandleInUse`] while other clones are alive.
    pub fn close(self) -> DbResult<()> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|_| DbError::HandleInUse)?;
        let conn = mutex.into_inner().map_err(|_| DbError::LockPoisoned)?;
        conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }

    fn run<T, E>(
        &self,
        behavior: TransactionBehavior,
        work: impl FnOnce(&Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut guard = self.lock()?;
        let tx = guard
            .transaction_with_behavior(behavior)
            .map_err(DbError::from)?;
        let value = work(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}
