use crate::binder::{self, PlaceholderStyle, Statement};
use crate::datefmt::DateLayout;
use crate::error::SqlRowMapError;
use crate::materialize::{
    ManyResult, QueryResult, SingleResult, materialize_generic, materialize_many,
    materialize_single,
};
use crate::results::ResultSet;
use crate::schema::Entity;
use crate::types::{ParamMap, Params, RowValues};

use super::Engine;

/// Where the SQL text of a chain comes from.
#[derive(Debug, Clone, Default)]
enum SqlSource {
    /// Generated from the table, filters, and id.
    #[default]
    Generated,
    Raw(String, Params),
    SqlMap(String, ParamMap),
    Template(String, ParamMap),
}

/// What a generated SELECT should look like.
struct SelectPlan<'s> {
    table: Option<&'s str>,
    columns: Option<Vec<&'static str>>,
    primary_key: Option<&'static str>,
    limit_one: bool,
}

impl SelectPlan<'static> {
    fn entity<T: Entity>(limit_one: bool) -> Self {
        let schema = T::schema();
        Self {
            table: Some(schema.table()),
            columns: Some(schema.column_names().collect()),
            primary_key: schema.primary_key(),
            limit_one,
        }
    }

    fn generic() -> Self {
        Self {
            table: None,
            columns: None,
            primary_key: None,
            limit_one: false,
        }
    }
}

/// One query chain.
///
/// Every verb consumes the chain and returns the updated value, so a chain cannot leak
/// state into another. Clone it to branch.
#[derive(Debug, Clone)]
#[must_use]
pub struct Query<'e> {
    engine: &'e Engine,
    source: SqlSource,
    table: Option<String>,
    conditions: Vec<(String, Vec<RowValues>)>,
    id: Option<RowValues>,
}

impl<'e> Query<'e> {
    pub(super) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            source: SqlSource::Generated,
            table: None,
            conditions: Vec::new(),
            id: None,
        }
    }

    pub fn sql(mut self, sql: impl Into<String>, params: impl Into<Params>) -> Self {
        self.source = SqlSource::Raw(sql.into(), params.into());
        self
    }

    pub fn sql_map_client(mut self, key: impl Into<String>, params: ParamMap) -> Self {
        self.source = SqlSource::SqlMap(key.into(), params);
        self
    }

    pub fn sql_template_client(mut self, name: impl Into<String>, params: ParamMap) -> Self {
        self.source = SqlSource::Template(name.into(), params);
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a predicate; predicates are joined with `AND` in call order.
    pub fn filter(mut self, predicate: impl Into<String>, args: Vec<RowValues>) -> Self {
        self.conditions.push((predicate.into(), args));
        self
    }

    pub fn id(mut self, id: impl Into<RowValues>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Fetch at most one row into `T`, returning whether it existed.
    ///
    /// # Errors
    /// Returns the binding, registry, or execution error that stopped the chain.
    pub async fn get<T: Entity>(self) -> Result<(bool, T), SqlRowMapError> {
        Ok(self.get_first::<T>().await?.into_parts())
    }

    /// Like [`Query::get`], but keeps the result encodable.
    ///
    /// # Errors
    /// Returns the binding, registry, or execution error that stopped the chain.
    pub async fn get_first<T: Entity>(self) -> Result<SingleResult<T>, SqlRowMapError> {
        let rs = self.fetch(SelectPlan::entity::<T>(true)).await?;
        Ok(materialize_single(&rs))
    }

    /// Fetch every matching row into `T`.
    ///
    /// # Errors
    /// Returns the binding, registry, or execution error that stopped the chain.
    pub async fn find<T: Entity>(self) -> Result<ManyResult<T>, SqlRowMapError> {
        let rs = self.fetch(SelectPlan::entity::<T>(false)).await?;
        Ok(materialize_many(&rs))
    }

    /// Fetch schema-less rows with their native value types.
    ///
    /// # Errors
    /// Returns the binding, registry, or execution error that stopped the chain.
    pub async fn query(self) -> Result<QueryResult, SqlRowMapError> {
        let rs = self.fetch(SelectPlan::generic()).await?;
        Ok(materialize_generic(rs, None))
    }

    /// Like [`Query::query`], rendering every timestamp value with `layout`.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] for an invalid layout, checked before the
    /// statement runs, or any error [`Query::query`] can return.
    pub async fn query_with_date_format(self, layout: &str) -> Result<QueryResult, SqlRowMapError> {
        let layout = DateLayout::parse(layout)?;
        let rs = self.fetch(SelectPlan::generic()).await?;
        Ok(materialize_generic(rs, Some(&layout)))
    }

    async fn fetch(&self, plan: SelectPlan<'_>) -> Result<ResultSet, SqlRowMapError> {
        let stmt = self.statement(&plan)?;
        tracing::debug!(sql = %stmt.sql, args = stmt.args.len(), "executing chain");
        self.engine.executor.execute(&stmt).await
    }

    /// Resolve the SQL source and bind it for the engine's executor.
    fn statement(&self, plan: &SelectPlan<'_>) -> Result<Statement, SqlRowMapError> {
        let executor = &self.engine.executor;
        let style = executor.placeholder_style();
        let mode = executor.named_arg_mode();

        if !matches!(self.source, SqlSource::Generated)
            && (self.table.is_some() || self.id.is_some() || !self.conditions.is_empty())
        {
            return Err(SqlRowMapError::BindError(
                "table, filter and id cannot be combined with explicit SQL".into(),
            ));
        }

        match &self.source {
            SqlSource::Generated => {
                let (sql, args) = self.select_sql(plan)?;
                binder::bind_positional(&sql, &args, style)
            }
            SqlSource::Raw(sql, params) => binder::bind(sql, params, style, mode),
            SqlSource::SqlMap(key, params) => {
                let sql = self.engine.sql_map.resolve(key)?;
                binder::bind_named(&sql, params, style, mode)
            }
            SqlSource::Template(name, params) => {
                let sql = self.engine.templates.render(name, params)?;
                binder::bind_named(&sql, params, style, mode)
            }
        }
    }

    fn select_sql(&self, plan: &SelectPlan<'_>) -> Result<(String, Vec<RowValues>), SqlRowMapError> {
        let table = self
            .table
            .as_deref()
            .or(plan.table)
            .ok_or_else(|| SqlRowMapError::BindError("no SQL or table to query".into()))?;
        let columns = plan
            .columns
            .as_ref()
            .map_or_else(|| "*".to_string(), |cols| cols.join(", "));

        let mut clauses = Vec::with_capacity(self.conditions.len() + 1);
        let mut args = Vec::new();
        for (predicate, values) in &self.conditions {
            // Each predicate must consume exactly its own arguments.
            let part = binder::bind_positional(predicate, values, PlaceholderStyle::Question)
                .map_err(|e| match e {
                    SqlRowMapError::BindError(msg) => {
                        SqlRowMapError::BindError(format!("filter {predicate:?}: {msg}"))
                    }
                    other => other,
                })?;
            clauses.push(format!("({})", part.sql));
            args.extend(part.args);
        }
        if let Some(id) = &self.id {
            let pk = plan.primary_key.ok_or_else(|| {
                SqlRowMapError::BindError("id() requires an entity with a primary key".into())
            })?;
            clauses.push(format!("{pk} = ?"));
            args.push(id.clone());
        }

        let mut sql = format!("SELECT {columns} FROM {table}");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if plan.limit_one {
            sql.push_str(" LIMIT 1");
        }
        Ok((sql, args))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::executor::StatementExecutor;
    use crate::params;
    use crate::registry::SqlMap;

    #[derive(Debug, Default, PartialEq)]
    struct Article {
        id: i64,
        title: String,
    }

    crate::entity! {
        Article in "article" pk "id" {
            id: i64,
            title: String,
        }
    }

    #[derive(Debug, Default)]
    struct Tag {
        name: String,
    }

    crate::entity! {
        Tag in "tag" {
            name: String,
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Statement>>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<Statement> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatementExecutor for Recorder {
        async fn execute(&self, stmt: &Statement) -> Result<ResultSet, SqlRowMapError> {
            self.seen.lock().unwrap().push(stmt.clone());
            let mut rs = ResultSet::new(vec!["id".into(), "title".into()]);
            rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("hello".into())]);
            Ok(rs)
        }

        fn placeholder_style(&self) -> PlaceholderStyle {
            PlaceholderStyle::Dollar
        }
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn generated_select_joins_filters_and_id() {
        let recorder = Recorder::default();
        let engine = Engine::new(recorder.clone());
        let (found, article) = block_on(
            engine
                .filter("title <> ?", vec!["draft".into()])
                .filter("id > ?", vec![1.into()])
                .id(2)
                .get::<Article>(),
        )
        .unwrap();
        assert!(found);
        assert_eq!(article, Article { id: 2, title: "hello".into() });

        let seen = recorder.seen();
        assert_eq!(
            seen[0].sql,
            "SELECT id, title FROM article WHERE (title <> $1) AND (id > $2) AND id = $3 LIMIT 1"
        );
        assert_eq!(
            seen[0].args,
            vec![RowValues::Text("draft".into()), RowValues::Int(1), RowValues::Int(2)]
        );
    }

    #[test]
    fn table_override_and_generic_select() {
        let recorder = Recorder::default();
        let engine = Engine::new(recorder.clone());
        block_on(engine.table("article_archive").find::<Article>()).unwrap();
        block_on(engine.table("article").query()).unwrap();
        let seen = recorder.seen();
        assert_eq!(seen[0].sql, "SELECT id, title FROM article_archive");
        assert_eq!(seen[1].sql, "SELECT * FROM article");
    }

    #[test]
    fn filter_arguments_stay_with_their_predicate() {
        let recorder = Recorder::default();
        let engine = Engine::new(recorder.clone());

        let shifted = block_on(
            engine
                .filter("id = ? and title = ?", vec![4.into()])
                .filter("userid = ?", vec!["fourth".into(), 1.into()])
                .find::<Article>(),
        );
        assert!(matches!(shifted, Err(SqlRowMapError::BindError(msg)) if msg.contains("id = ? and title = ?")));
        assert!(recorder.seen().is_empty());

        block_on(
            engine
                .filter("title = ?2 or id = ?1", vec![4.into(), "fourth".into()])
                .filter("userid = ?", vec![1.into()])
                .find::<Article>(),
        )
        .unwrap();
        let seen = recorder.seen();
        assert_eq!(
            seen[0].sql,
            "SELECT id, title FROM article WHERE (title = $1 or id = $2) AND (userid = $3)"
        );
        assert_eq!(
            seen[0].args,
            vec![RowValues::Text("fourth".into()), RowValues::Int(4), RowValues::Int(1)]
        );
    }

    #[test]
    fn chains_branch_independently() {
        let recorder = Recorder::default();
        let engine = Engine::new(recorder.clone());
        let base = engine.filter("id > ?", vec![1.into()]);
        let narrowed = base.clone().filter("id < ?", vec![9.into()]);
        block_on(base.find::<Article>()).unwrap();
        block_on(narrowed.find::<Article>()).unwrap();
        let seen = recorder.seen();
        assert_eq!(seen[0].args.len(), 1);
        assert_eq!(seen[1].args.len(), 2);
    }

    #[test]
    fn invalid_chains_fail_before_execution() {
        let recorder = Recorder::default();
        let engine = Engine::new(recorder.clone());

        let mixed = block_on(engine.sql("select 1", ()).id(3).query());
        assert!(matches!(mixed, Err(SqlRowMapError::BindError(_))));

        let no_pk = block_on(engine.id(1).find::<Tag>());
        assert!(matches!(no_pk, Err(SqlRowMapError::BindError(_))));

        let nothing = block_on(engine.chain().query());
        assert!(matches!(nothing, Err(SqlRowMapError::BindError(_))));

        let layout = block_on(engine.table("article").query_with_date_format("%Q"));
        assert!(matches!(layout, Err(SqlRowMapError::ConfigError(_))));

        let unknown = block_on(engine.sql_map_client("doesNotExist", params! {}).query());
        assert!(matches!(unknown, Err(SqlRowMapError::ConfigError(_))));

        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn sql_map_binds_named_params() {
        let recorder = Recorder::default();
        let mut map = SqlMap::new();
        map.insert("byUser", "select * from article where id = ?id and userid = ?userid");
        let engine = Engine::builder(recorder.clone()).sql_map(map).build();
        block_on(
            engine
                .sql_map_client("byUser", params! { "userid" => 1, "id" => 4 })
                .query(),
        )
        .unwrap();
        let seen = recorder.seen();
        assert_eq!(seen[0].sql, "select * from article where id = $1 and userid = $2");
        assert_eq!(seen[0].args, vec![RowValues::Int(4), RowValues::Int(1)]);
    }
}
