//! Query binding, row materialization, and JSON/XML encoding for relational data.
//!
//! A query chain starts on an [`Engine`], binds its parameters for the executor's
//! placeholder syntax, runs one statement, and maps the rows onto structs declared with
//! [`entity!`] or onto schema-less rows. Results encode to JSON or XML.
//!
//! ```rust,no_run
//! use sql_rowmap::prelude::*;
//! use sql_rowmap::params;
//!
//! # async fn demo() -> Result<(), SqlRowMapError> {
//! let executor = SqliteOptionsBuilder::new("blog.db").build().await?;
//! let engine = Engine::new(executor);
//!
//! let xml = engine
//!     .sql(
//!         "select id, title from article where id = ?id and userid = ?userid",
//!         params! { "id" => 4, "userid" => 1 },
//!     )
//!     .query_with_date_format("20060102")
//!     .await?
//!     .xml_indent("", "  ", "article")?;
//! # let _ = xml;
//! # Ok(()) }
//! ```

pub mod binder;
pub mod datefmt;
pub mod encode;
pub mod engine;
pub mod error;
pub mod executor;
pub mod materialize;
pub mod prelude;
pub mod registry;
pub mod results;
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

pub use async_trait::async_trait;

pub use binder::{NamedArgMode, PlaceholderStyle, Statement, bind, bind_named, bind_positional};
pub use datefmt::DateLayout;
pub use encode::{Encodable, Encoded, Format, encode};
pub use engine::{Engine, EngineBuilder, Query};
pub use error::SqlRowMapError;
pub use executor::StatementExecutor;
pub use materialize::{
    ManyResult, QueryResult, SingleResult, materialize_generic, materialize_many,
    materialize_single,
};
pub use registry::{SqlMap, SqlMapRegistry, SqlTemplateRegistry, SqlTemplates};
pub use results::{ResultSet, Row};
pub use schema::{Entity, Schema};
pub use types::{ParamMap, Params, RowValues};
