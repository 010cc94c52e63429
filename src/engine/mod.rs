//! Fluent façade over binding, execution, materialization, and encoding.
//!
//! ```rust,no_run
//! use chrono::NaiveDateTime;
//! use sql_rowmap::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Article {
//!     id: i64,
//!     title: String,
//!     created: NaiveDateTime,
//! }
//!
//! sql_rowmap::entity! {
//!     Article in "article" pk "id" {
//!         id: i64,
//!         title: String,
//!         created as "createdatetime": NaiveDateTime => "2006/01/02",
//!     }
//! }
//!
//! # async fn demo() -> Result<(), SqlRowMapError> {
//! let executor = SqliteOptionsBuilder::new("blog.db").build().await?;
//! let engine = Engine::new(executor);
//!
//! let (found, article) = engine.id(2).get::<Article>().await?;
//! let json = engine
//!     .sql("select * from article where id > ?", vec![RowValues::Int(1)])
//!     .find::<Article>()
//!     .await?
//!     .json()?;
//! # let _ = (found, article, json);
//! # Ok(()) }
//! ```

mod query;

pub use query::Query;

use std::sync::Arc;

use crate::executor::StatementExecutor;
use crate::registry::{SqlMap, SqlMapRegistry, SqlTemplateRegistry, SqlTemplates};
use crate::types::{ParamMap, Params, RowValues};

/// Shared entry point for query chains.
///
/// Cloning is cheap; the executor and registries are reference counted and never mutated
/// by a chain.
#[derive(Clone)]
pub struct Engine {
    executor: Arc<dyn StatementExecutor>,
    sql_map: Arc<dyn SqlMapRegistry>,
    templates: Arc<dyn SqlTemplateRegistry>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("placeholder_style", &self.executor.placeholder_style())
            .field("named_arg_mode", &self.executor.named_arg_mode())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// An engine with empty SQL map and template registries.
    #[must_use]
    pub fn new(executor: impl StatementExecutor + 'static) -> Self {
        EngineBuilder::new(executor).build()
    }

    #[must_use]
    pub fn builder(executor: impl StatementExecutor + 'static) -> EngineBuilder {
        EngineBuilder::new(executor)
    }

    #[must_use]
    pub fn executor(&self) -> &dyn StatementExecutor {
        self.executor.as_ref()
    }

    /// Start an empty chain.
    #[must_use]
    pub fn chain(&self) -> Query<'_> {
        Query::new(self)
    }

    /// Start a chain from literal SQL with positional or named parameters.
    #[must_use]
    pub fn sql(&self, sql: impl Into<String>, params: impl Into<Params>) -> Query<'_> {
        self.chain().sql(sql, params)
    }

    /// Start a chain from a keyed statement in the SQL map.
    #[must_use]
    pub fn sql_map_client(&self, key: impl Into<String>, params: ParamMap) -> Query<'_> {
        self.chain().sql_map_client(key, params)
    }

    /// Start a chain from a rendered SQL template.
    #[must_use]
    pub fn sql_template_client(&self, name: impl Into<String>, params: ParamMap) -> Query<'_> {
        self.chain().sql_template_client(name, params)
    }

    /// Start a chain selecting from `table` instead of the entity's own table.
    #[must_use]
    pub fn table(&self, table: impl Into<String>) -> Query<'_> {
        self.chain().table(table)
    }

    /// Start a chain with one predicate; `args` bind its `?` placeholders.
    #[must_use]
    pub fn filter(&self, predicate: impl Into<String>, args: Vec<RowValues>) -> Query<'_> {
        self.chain().filter(predicate, args)
    }

    /// Start a chain filtered on the entity's primary key.
    #[must_use]
    pub fn id(&self, id: impl Into<RowValues>) -> Query<'_> {
        self.chain().id(id)
    }
}

/// Assembles an [`Engine`] from an executor and optional registries.
///
/// ```rust
/// use sql_rowmap::prelude::*;
/// use sql_rowmap::{ResultSet, async_trait};
///
/// struct Empty;
///
/// #[async_trait]
/// impl StatementExecutor for Empty {
///     async fn execute(&self, _stmt: &Statement) -> Result<ResultSet, SqlRowMapError> {
///         Ok(ResultSet::new(vec!["id".into()]))
///     }
///     fn placeholder_style(&self) -> PlaceholderStyle {
///         PlaceholderStyle::Dollar
///     }
/// }
///
/// let mut map = SqlMap::new();
/// map.insert("selectAllArticle", "select * from article");
/// let engine = Engine::builder(Empty).sql_map(map).build();
/// assert_eq!(engine.executor().placeholder_style(), PlaceholderStyle::Dollar);
/// ```
pub struct EngineBuilder {
    executor: Arc<dyn StatementExecutor>,
    sql_map: Option<Arc<dyn SqlMapRegistry>>,
    templates: Option<Arc<dyn SqlTemplateRegistry>>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(executor: impl StatementExecutor + 'static) -> Self {
        Self::from_shared(Arc::new(executor))
    }

    /// Use an executor that is already shared elsewhere.
    #[must_use]
    pub fn from_shared(executor: Arc<dyn StatementExecutor>) -> Self {
        Self {
            executor,
            sql_map: None,
            templates: None,
        }
    }

    #[must_use]
    pub fn sql_map(mut self, registry: impl SqlMapRegistry + 'static) -> Self {
        self.sql_map = Some(Arc::new(registry));
        self
    }

    #[must_use]
    pub fn templates(mut self, registry: impl SqlTemplateRegistry + 'static) -> Self {
        self.templates = Some(Arc::new(registry));
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            executor: self.executor,
            sql_map: self
                .sql_map
                .unwrap_or_else(|| Arc::new(SqlMap::default())),
            templates: self
                .templates
                .unwrap_or_else(|| Arc::new(SqlTemplates::default())),
        }
    }
}
