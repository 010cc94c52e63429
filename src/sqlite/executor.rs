use std::sync::Arc;

use async_trait::async_trait;
use bb8::Pool;

use crate::binder::{NamedArgMode, PlaceholderStyle, Statement};
use crate::error::SqlRowMapError;
use crate::executor::StatementExecutor;
use crate::results::ResultSet;

use super::config::{SharedSqliteConnection, SqliteManager, SqliteOptions, build_pool};
use super::params::convert_params;
use super::query::build_result_set;

/// [`StatementExecutor`] backed by a bb8 pool of `rusqlite` connections.
///
/// Each call checks out a connection and runs the statement on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteExecutor {
    pool: Pool<SqliteManager>,
    named_args: NamedArgMode,
}

impl std::fmt::Debug for SqliteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteExecutor")
            .field("state", &self.pool.state())
            .field("named_args", &self.named_args)
            .finish()
    }
}

impl SqliteExecutor {
    /// Create the pool and run the startup pragmas.
    ///
    /// # Errors
    /// Returns `SqlRowMapError::ExecutionError` if the pool cannot be created or the first
    /// connection fails.
    pub async fn new(opts: SqliteOptions) -> Result<Self, SqlRowMapError> {
        let pool = build_pool(&opts).await?;
        let executor = Self {
            pool,
            named_args: opts.named_args,
        };
        if opts.wal {
            executor.execute_batch("PRAGMA journal_mode = WAL;").await?;
        }
        Ok(executor)
    }

    /// Run a script of statements without parameters, e.g. schema setup.
    ///
    /// # Errors
    /// Returns `SqlRowMapError::ExecutionError` if any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlRowMapError> {
        let sql = sql.to_string();
        let conn = self.pool.get().await?;
        run_blocking(Arc::clone(&*conn), move |guard| {
            guard.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl StatementExecutor for SqliteExecutor {
    async fn execute(&self, stmt: &Statement) -> Result<ResultSet, SqlRowMapError> {
        let sql = stmt.sql.clone();
        let params = convert_params(&stmt.args);
        let conn = self.pool.get().await?;
        tracing::debug!(sql = %sql, args = params.len(), "sqlite execute");
        run_blocking(Arc::clone(&*conn), move |guard| {
            let mut prepared = guard.prepare(&sql)?;
            build_result_set(&mut prepared, &params)
        })
        .await
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn named_arg_mode(&self) -> NamedArgMode {
        self.named_args
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, SqlRowMapError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlRowMapError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await?
}
