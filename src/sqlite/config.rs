use std::future::Future;
use std::sync::Arc;

use bb8::{ManageConnection, Pool};
use tokio::sync::Mutex;

use crate::binder::NamedArgMode;
use crate::error::SqlRowMapError;

use super::executor::SqliteExecutor;

/// A pooled `SQLite` connection, locked for the duration of each blocking call.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let path = self.db_path.clone();
        async move {
            let conn = rusqlite::Connection::open(path)?;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move { handle.lock().await.execute_batch("SELECT 1") }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Options for configuring a `SQLite` executor.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub max_connections: u32,
    pub named_args: NamedArgMode,
    pub wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_connections: 4,
            named_args: NamedArgMode::default(),
            wal: true,
        }
    }
}

/// Fluent builder for `SQLite` options.
///
/// ```rust,no_run
/// use sql_rowmap::prelude::*;
///
/// # async fn demo() -> Result<(), SqlRowMapError> {
/// let executor = SqliteOptionsBuilder::new("blog.db")
///     .max_connections(8)
///     .named_args(NamedArgMode::Dedup)
///     .build()
///     .await?;
/// # let _ = executor;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.opts.max_connections = max_connections.max(1);
        self
    }

    #[must_use]
    pub fn named_args(mut self, mode: NamedArgMode) -> Self {
        self.opts.named_args = mode;
        self
    }

    /// Toggle `PRAGMA journal_mode = WAL` on startup.
    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build the pool and executor.
    ///
    /// # Errors
    /// Returns `SqlRowMapError` if pool creation or the initial smoke test fails.
    pub async fn build(self) -> Result<SqliteExecutor, SqlRowMapError> {
        SqliteExecutor::new(self.finish()).await
    }
}

/// Create the pool described by `opts`. A pool size of zero is raised to one.
pub(super) async fn build_pool(opts: &SqliteOptions) -> Result<Pool<SqliteManager>, SqlRowMapError> {
    Pool::builder()
        .max_size(opts.max_connections.max(1))
        .build(SqliteManager::new(opts.db_path.clone()))
        .await
        .map_err(|e| SqlRowMapError::ExecutionError(format!("sqlite pool error: {e}")))
}
