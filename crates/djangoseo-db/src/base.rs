//! Base database backend trait and connection configuration.
//!
//! The redirect store's SQL implementation is written against
//! [`DatabaseBackend`], so any engine that can run parameterized SQL and hand
//! back [`Row`]s can hold redirect data.

use djangoseo_core::settings::DatabaseSettings;
use djangoseo_core::SeoError;

use crate::row::Row;
use crate::value::Value;

/// The core trait for database backends.
///
/// All methods are async because database operations are I/O-bound. Backends
/// built on synchronous drivers (like `rusqlite`) run their work in
/// `spawn_blocking` to keep this interface.
///
/// Parameters use `?` placeholders, bound positionally.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite").
    fn vendor(&self) -> &str;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected. A uniqueness violation is
    /// reported as [`SeoError::IntegrityError`].
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, SeoError>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SeoError>;

    /// Executes a SQL query and returns exactly one row.
    ///
    /// Returns [`SeoError::DoesNotExist`] if no rows are returned, or
    /// [`SeoError::MultipleObjectsReturned`] if more than one row is returned.
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Row, SeoError> {
        let rows = self.query(sql, params).await?;
        let count = rows.len();
        let mut rows = rows.into_iter();
        match (rows.next(), count) {
            (None, _) => Err(SeoError::DoesNotExist("No rows returned".to_string())),
            (Some(row), 1) => Ok(row),
            (Some(_), n) => Err(SeoError::MultipleObjectsReturned(format!(
                "Expected 1 row, got {n}"
            ))),
        }
    }

    /// Returns the row id produced by the most recent successful insert on
    /// this connection.
    async fn last_insert_id(&self) -> Result<i64, SeoError>;
}

/// Configuration for connecting to a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// The engine identifier, e.g. `djangoseo.db.backends.sqlite3`.
    pub engine: String,
    /// The database name or file path.
    pub name: String,
}

impl DatabaseConfig {
    /// The engine identifier for SQLite.
    pub const SQLITE_ENGINE: &'static str = "djangoseo.db.backends.sqlite3";

    /// Creates a configuration for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::sqlite_file(":memory:")
    }

    /// Creates a configuration for a SQLite file database.
    pub fn sqlite_file(path: impl Into<String>) -> Self {
        Self {
            engine: Self::SQLITE_ENGINE.to_string(),
            name: path.into(),
        }
    }

    /// Builds a configuration from the `database` section of the settings.
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self {
            engine: settings.engine.clone(),
            name: settings.name.clone(),
        }
    }

    /// Returns `true` if the engine is SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.engine == Self::SQLITE_ENGINE || self.engine.ends_with("sqlite3")
    }

    /// Returns an error unless the configured engine is supported.
    pub fn ensure_supported(&self) -> Result<(), SeoError> {
        if self.is_sqlite() {
            Ok(())
        } else {
            Err(SeoError::ImproperlyConfigured(format!(
                "Unsupported database engine '{}'",
                self.engine
            )))
        }
    }
}
