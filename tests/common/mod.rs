#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;
use regex::Regex;
use sql_rowmap::prelude::*;
use sql_rowmap::async_trait;
use tempfile::TempDir;

pub const SCHEMA: &str = "
CREATE TABLE article (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT,
    createdatetime DATETIME,
    userid INTEGER,
    viewcount INTEGER,
    published BOOLEAN,
    rating REAL
);
INSERT INTO article VALUES (1, 'hello', 'first post', '2024-03-05 00:00:00', 1, 10, 1, 4.5);
INSERT INTO article VALUES (2, 'second', 'by someone else', '2024-03-06 12:30:00', 2, 3, 0, 3.25);
INSERT INTO article VALUES (4, 'fourth', NULL, '2024-03-05 08:15:00', 1, 0, 1, NULL);
";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub created: NaiveDateTime,
    pub userid: i32,
    pub viewcount: i32,
}

sql_rowmap::entity! {
    Article in "article" pk "id" {
        id: i64,
        title: String,
        content: Option<String>,
        created as "createdatetime": NaiveDateTime => "2006-01-02 15:04",
        userid: i32,
        viewcount: i32,
    }
}

/// Counts statements before handing them to the wrapped executor.
pub struct Counting<E> {
    pub inner: E,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl<E: StatementExecutor> StatementExecutor for Counting<E> {
    async fn execute(&self, stmt: &Statement) -> Result<ResultSet, SqlRowMapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(stmt).await
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.inner.placeholder_style()
    }

    fn named_arg_mode(&self) -> NamedArgMode {
        self.inner.named_arg_mode()
    }
}

/// Route library logs to the test harness; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A fresh database file seeded with the article table.
pub async fn seeded_executor(dir: &TempDir) -> Result<SqliteExecutor, SqlRowMapError> {
    init_tracing();
    let path = dir.path().join("blog.db");
    let executor = SqliteOptionsBuilder::new(path.to_string_lossy())
        .max_connections(4)
        .build()
        .await?;
    executor.execute_batch(SCHEMA).await?;
    Ok(executor)
}

/// Walks `xml` as a tree of plain elements and returns the root name plus the names of its
/// direct children. Fails on unbalanced tags, stray markup, or content outside the root.
pub fn xml_children(xml: &str) -> Result<(String, Vec<String>), String> {
    let tag = Regex::new(r"<(/?)([A-Za-z_][A-Za-z0-9_.-]*)>").map_err(|e| e.to_string())?;
    let mut stack: Vec<&str> = Vec::new();
    let mut root: Option<&str> = None;
    let mut children = Vec::new();
    let mut last = 0;
    for caps in tag.captures_iter(xml) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let between = &xml[last..whole.start()];
        if between.contains(['<', '>']) {
            return Err(format!("stray markup in {between:?}"));
        }
        if stack.is_empty() && !between.trim().is_empty() {
            return Err(format!("text outside the root element: {between:?}"));
        }
        last = whole.end();
        let name = name.as_str();
        if caps.get(1).is_some_and(|m| m.as_str() == "/") {
            match stack.pop() {
                Some(open) if open == name => {}
                open => return Err(format!("</{name}> closes {open:?}")),
            }
        } else {
            match stack.len() {
                0 if root.is_some() => return Err(format!("second root <{name}>")),
                0 => root = Some(name),
                1 => children.push(name.to_string()),
                _ => {}
            }
            stack.push(name);
        }
    }
    if !stack.is_empty() {
        return Err(format!("unclosed elements {stack:?}"));
    }
    if !xml[last..].trim().is_empty() {
        return Err("text after the root element".into());
    }
    root.map(|r| (r.to_string(), children))
        .ok_or_else(|| "no root element".to_string())
}
