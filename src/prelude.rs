//! Common imports for building and running query chains.
//!
//! ```rust
//! use sql_rowmap::prelude::*;
//! ```

pub use crate::binder::{NamedArgMode, PlaceholderStyle, Statement};
pub use crate::datefmt::DateLayout;
pub use crate::encode::{Encoded, Format};
pub use crate::engine::{Engine, EngineBuilder, Query};
pub use crate::error::SqlRowMapError;
pub use crate::executor::StatementExecutor;
pub use crate::materialize::{ManyResult, QueryResult, SingleResult};
pub use crate::registry::{SqlMap, SqlMapRegistry, SqlTemplateRegistry, SqlTemplates};
pub use crate::results::{ResultSet, Row};
pub use crate::schema::Entity;
pub use crate::types::{ParamMap, Params, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteExecutor, SqliteOptions, SqliteOptionsBuilder};
