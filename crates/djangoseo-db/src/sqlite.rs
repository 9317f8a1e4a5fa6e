//! SQLite database backend using `rusqlite`.
//!
//! [`SqliteBackend`] implements [`DatabaseBackend`](crate::base::DatabaseBackend)
//! on a single `rusqlite` connection guarded by a `tokio` mutex. Every call
//! runs inside `tokio::task::spawn_blocking`, so the async runtime is never
//! blocked on disk I/O.
//!
//! - WAL mode is enabled for file databases
//! - `:memory:` opens an in-memory database (handy for tests)
//! - `UNIQUE` violations surface as [`SeoError::IntegrityError`]

use std::path::PathBuf;
use std::sync::Arc;

use djangoseo_core::SeoError;
use rusqlite::types::ValueRef;
use tokio::sync::Mutex;

use crate::base::{DatabaseBackend, DatabaseConfig};
use crate::row::Row;
use crate::value::Value;

/// A SQLite database backend.
pub struct SqliteBackend {
    path: PathBuf,
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SeoError> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| SeoError::OperationalError(format!("SQLite open failed: {e}")))?;

        if !in_memory {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| SeoError::OperationalError(format!("Failed to set pragmas: {e}")))?;
        }

        tracing::debug!(path = %path.display(), "opened sqlite database");

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> Result<Self, SeoError> {
        Self::open(":memory:")
    }

    /// Opens the database described by a [`DatabaseConfig`].
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, SeoError> {
        config.ensure_supported()?;
        Self::open(&config.name)
    }

    /// Returns the database file path.
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }

    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> Result<(), SeoError> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
            }
            .map_err(|e| SeoError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> Row {
        let values = (0..column_names.len())
            .map(|i| match sqlite_row.get_ref(i).unwrap_or(ValueRef::Null) {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
                ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
            })
            .collect();

        Row::new(column_names.to_vec(), values)
    }
}

/// Maps a `rusqlite` error onto [`SeoError`], keeping constraint violations
/// distinguishable from other failures.
fn map_error(e: &rusqlite::Error) -> SeoError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            SeoError::IntegrityError(e.to_string())
        }
        _ => SeoError::DatabaseError(e.to_string()),
    }
}

fn join_error(e: &tokio::task::JoinError) -> SeoError {
    SeoError::DatabaseError(format!("Task join error: {e}"))
}

#[async_trait::async_trait]
impl DatabaseBackend for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, SeoError> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| map_error(&e))?;
            Self::bind_params(&mut stmt, &params)?;
            let count = stmt.raw_execute().map_err(|e| map_error(&e))?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SeoError> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| map_error(&e))?;

            let column_names: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();

            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows.next().map_err(|e| map_error(&e))? {
                rows.push(Self::convert_row(row, &column_names));
            }

            Ok(rows)
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    async fn last_insert_id(&self) -> Result<i64, SeoError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || conn.blocking_lock().last_insert_rowid())
            .await
            .map_err(|e| join_error(&e))
    }
}
