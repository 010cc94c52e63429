// SQLite executor
//
// - config: pool manager and options builder
// - params: conversion from RowValues to rusqlite values
// - query: result extraction and building
// - executor: the StatementExecutor implementation

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, SqliteOptions, SqliteOptionsBuilder};
pub use executor::SqliteExecutor;
pub use query::build_result_set;
