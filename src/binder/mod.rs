//! Parameter binding: turns positional or named parameter input into a
//! [`Statement`] whose placeholders match the target driver.

use std::collections::HashMap;
use std::fmt::Write;

use clap::ValueEnum;

use crate::error::SqlRowMapError;
use crate::types::{ParamMap, Params, RowValues};

mod scanner;

use scanner::{Placeholder, Token, placeholders};

/// Placeholder syntax emitted into bound SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum PlaceholderStyle {
    /// Anonymous `?` placeholders (MySQL, ODBC).
    #[default]
    Question,
    /// Numbered `?1`, `?2` placeholders (SQLite).
    Numbered,
    /// Numbered `$1`, `$2` placeholders (PostgreSQL).
    Dollar,
}

impl PlaceholderStyle {
    fn write(self, out: &mut String, index: usize) {
        // Writing into a String cannot fail.
        let _ = match self {
            PlaceholderStyle::Question => write!(out, "?"),
            PlaceholderStyle::Numbered => write!(out, "?{index}"),
            PlaceholderStyle::Dollar => write!(out, "${index}"),
        };
    }

    fn is_numbered(self) -> bool {
        !matches!(self, PlaceholderStyle::Question)
    }
}

/// How repeated uses of the same named parameter are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum NamedArgMode {
    /// Every occurrence gets its own argument slot.
    #[default]
    AppendPerOccurrence,
    /// Repeated names reuse the first slot. Requires a numbered placeholder style;
    /// with [`PlaceholderStyle::Question`] this behaves like `AppendPerOccurrence`.
    Dedup,
}

/// SQL text plus its ordered arguments, ready for execution.
///
/// ```rust
/// use sql_rowmap::prelude::*;
///
/// let stmt = Statement::new(
///     "INSERT INTO t (id, name) VALUES (?1, ?2)",
///     vec![RowValues::Int(1), RowValues::Text("alice".into())],
/// );
/// assert_eq!(stmt.args.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The SQL text with driver placeholders
    pub sql: String,
    /// The arguments in placeholder order
    pub args: Vec<RowValues>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<RowValues>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// A statement with no arguments.
    pub fn without_args(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Bind either form of [`Params`] against `sql`.
///
/// # Errors
/// Returns [`SqlRowMapError::BindError`] as described for [`bind_positional`] and [`bind_named`].
pub fn bind(
    sql: &str,
    params: &Params,
    style: PlaceholderStyle,
    mode: NamedArgMode,
) -> Result<Statement, SqlRowMapError> {
    match params {
        Params::Positional(args) => bind_positional(sql, args, style),
        Params::Named(map) => bind_named(sql, map, style, mode),
    }
}

/// Bind positional arguments to `?` placeholders, left to right.
///
/// Explicitly numbered placeholders (`?N` or `$N`) are accepted as long as no bare `?` is
/// present; the highest index must then equal the number of arguments.
///
/// # Errors
/// Returns [`SqlRowMapError::BindError`] on a count mismatch, when bare and numbered
/// placeholders are mixed, or when a named placeholder appears.
pub fn bind_positional(
    sql: &str,
    args: &[RowValues],
    style: PlaceholderStyle,
) -> Result<Statement, SqlRowMapError> {
    let found = placeholders(sql);
    let bare = found.iter().filter(|p| p.token == Token::Bare).count();
    let mut numbered = Vec::with_capacity(found.len() - bare);
    for p in &found {
        match p.token {
            Token::Bare => {}
            Token::Dollar(n) => numbered.push(n),
            Token::Question(ident) => match ident.parse::<usize>() {
                Ok(n) => numbered.push(n),
                Err(_) => {
                    return Err(SqlRowMapError::BindError(format!(
                        "named placeholder ?{ident} used with positional arguments"
                    )));
                }
            },
        }
    }

    if bare > 0 && !numbered.is_empty() {
        return Err(SqlRowMapError::BindError(
            "bare and numbered placeholders cannot be mixed".into(),
        ));
    }

    if numbered.is_empty() {
        if bare != args.len() {
            return Err(SqlRowMapError::BindError(format!(
                "statement has {bare} placeholder(s) but {} argument(s) were supplied",
                args.len()
            )));
        }
        let mut next = 0;
        let sql = rewrite(sql, &found, |out, _| {
            next += 1;
            style.write(out, next);
            Ok(())
        })?;
        return Ok(Statement::new(sql, args.to_vec()));
    }

    let highest = numbered.iter().copied().max().unwrap_or(0);
    if numbered.contains(&0) || highest != args.len() {
        return Err(SqlRowMapError::BindError(format!(
            "numbered placeholders reference {highest} argument(s) but {} were supplied",
            args.len()
        )));
    }
    if style.is_numbered() {
        let sql = rewrite(sql, &found, |out, p| {
            let index = match p.token {
                Token::Dollar(n) => n,
                Token::Question(ident) => ident.parse().unwrap_or_default(),
                Token::Bare => 0,
            };
            style.write(out, index);
            Ok(())
        })?;
        Ok(Statement::new(sql, args.to_vec()))
    } else {
        // Anonymous placeholders need one argument per occurrence.
        let mut ordered = Vec::with_capacity(numbered.len());
        let sql = rewrite(sql, &found, |out, _| {
            let n = numbered[ordered.len()];
            ordered.push(args[n - 1].clone());
            style.write(out, ordered.len());
            Ok(())
        })?;
        Ok(Statement::new(sql, ordered))
    }
}

/// Bind a named-parameter map to `?name` placeholders.
///
/// Arguments are appended in placeholder order, so the result is independent of the
/// map's iteration order.
///
/// # Errors
/// Returns [`SqlRowMapError::BindError`] when a placeholder has no matching key, or when
/// bare `?` or `$N` placeholders are mixed with named ones.
pub fn bind_named(
    sql: &str,
    params: &ParamMap,
    style: PlaceholderStyle,
    mode: NamedArgMode,
) -> Result<Statement, SqlRowMapError> {
    let found = placeholders(sql);
    let dedup = matches!(mode, NamedArgMode::Dedup) && style.is_numbered();
    let mut args: Vec<RowValues> = Vec::with_capacity(found.len());
    let mut slots: HashMap<&str, usize> = HashMap::new();

    let sql = rewrite(sql, &found, |out, p| {
        let Token::Question(name) = p.token else {
            return Err(SqlRowMapError::BindError(
                "positional placeholders cannot be mixed with named parameters".into(),
            ));
        };
        if dedup && let Some(&slot) = slots.get(name) {
            style.write(out, slot);
            return Ok(());
        }
        let value = params.get(name).ok_or_else(|| {
            SqlRowMapError::BindError(format!("no value supplied for named parameter ?{name}"))
        })?;
        args.push(value.clone());
        slots.insert(name, args.len());
        style.write(out, args.len());
        Ok(())
    })?;

    Ok(Statement::new(sql, args))
}

fn rewrite<'a>(
    sql: &'a str,
    found: &[Placeholder<'a>],
    mut emit: impl FnMut(&mut String, &Placeholder<'a>) -> Result<(), SqlRowMapError>,
) -> Result<String, SqlRowMapError> {
    let mut out = String::with_capacity(sql.len() + found.len() * 2);
    let mut last = 0;
    for p in found {
        out.push_str(&sql[last..p.start]);
        emit(&mut out, p)?;
        last = p.end;
    }
    out.push_str(&sql[last..]);
    Ok(out)
}
