//! Persistence gateway for visitor records
//!
//! Every operation opens its own connection and drops it before returning,
//! so no connection is ever held between chat messages.

mod schema;

pub use schema::*;

use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Handle to the visitor database. Holds only the location; connections are
/// opened per call.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create the database file and `visitors` table if they do not exist
    pub fn ensure_schema(&self) -> DbResult<()> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection to an existing database. A missing file counts as
    /// the database being unreachable rather than a fresh empty store.
    fn connect(&self) -> DbResult<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DbError::Unavailable(e.to_string()))
    }

    // ==================== Visitor Operations ====================

    /// Insert one visitor row. Failures are logged and reported as `false`.
    pub fn insert_visitor(&self, record: &VisitorRecord) -> bool {
        let conn = match self.connect() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "Error while connecting to database");
                return false;
            }
        };

        match conn.execute(
            INSERT_VISITOR,
            params![
                record.timestamp,
                record.name,
                record.organization,
                record.purpose,
                record.photo
            ],
        ) {
            Ok(_) => {
                tracing::info!(name = %record.name, at = %record.timestamp, "Visitor recorded");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error while inserting visitor");
                false
            }
        }
    }

    /// Count all visitor rows
    pub fn count_visitors(&self) -> DbResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(COUNT_VISITORS, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// All stored rows, oldest first
    #[cfg(test)]
    pub fn list_visitors(&self) -> DbResult<Vec<VisitorRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT tanggal, nama, asal_instansi, keperluan, gambar FROM visitors ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(VisitorRecord {
                timestamp: row.get(0)?,
                name: row.get(1)?,
                organization: row.get(2)?,
                purpose: row.get(3)?,
                photo: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}
