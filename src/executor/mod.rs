//! The boundary to the data source.

use async_trait::async_trait;

use crate::binder::{NamedArgMode, PlaceholderStyle, Statement};
use crate::error::SqlRowMapError;
use crate::results::ResultSet;

/// Runs bound statements against a data source.
///
/// Implementations may be shared by many concurrent query chains. Timeouts, cancellation,
/// and retries belong to the implementation; failures surface as
/// [`SqlRowMapError::ExecutionError`].
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Execute one statement and return its rows, in one round trip.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ExecutionError`] wrapping the data source failure.
    async fn execute(&self, stmt: &Statement) -> Result<ResultSet, SqlRowMapError>;

    /// Placeholder syntax the data source expects.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// How repeated named parameters should be bound for this data source.
    fn named_arg_mode(&self) -> NamedArgMode {
        NamedArgMode::AppendPerOccurrence
    }
}
