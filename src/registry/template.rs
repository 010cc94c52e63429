use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlRowMapError;
use crate::types::{ParamMap, RowValues};

use super::{parse_json_entries, read_json_entries};

/// Renders named SQL templates against a parameter map.
pub trait SqlTemplateRegistry: Send + Sync {
    /// Render the template registered as `name`.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] when the template is unknown.
    fn render(&self, name: &str, params: &ParamMap) -> Result<String, SqlRowMapError>;
}

/// Registry of parsed SQL templates.
///
/// Templates are plain SQL with conditional directives. `{%-` and `-%}` strip the whitespace
/// before or after a directive.
///
/// ```rust
/// use sql_rowmap::prelude::*;
/// use sql_rowmap::params;
///
/// let mut templates = SqlTemplates::new();
/// templates.register(
///     "select.example.stpl",
///     "select id from article where id = ?id{% if count > 1 %} and userid = ?userid{% endif %}",
/// )?;
/// let sql = templates.render("select.example.stpl", &params! { "id" => 2, "count" => 1 })?;
/// assert_eq!(sql, "select id from article where id = ?id");
/// # Ok::<(), SqlRowMapError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlTemplates {
    templates: HashMap<String, Vec<Node>>,
}

impl SqlTemplates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a template.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the template is malformed.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        text: &str,
    ) -> Result<&mut Self, SqlRowMapError> {
        let name = name.into();
        let nodes = parse(text)
            .map_err(|msg| SqlRowMapError::ConfigError(format!("template {name:?}: {msg}")))?;
        self.templates.insert(name, nodes);
        Ok(self)
    }

    /// Build a registry from a JSON object of `name -> template text`.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the document or any template is malformed.
    pub fn from_json_str(text: &str) -> Result<Self, SqlRowMapError> {
        Self::from_entries(parse_json_entries(text)?)
    }

    /// Build a registry from a JSON file.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlRowMapError> {
        Self::from_entries(read_json_entries(path.as_ref())?)
    }

    fn from_entries(entries: HashMap<String, String>) -> Result<Self, SqlRowMapError> {
        let mut templates = Self::new();
        for (name, text) in entries {
            templates.register(name, &text)?;
        }
        Ok(templates)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl SqlTemplateRegistry for SqlTemplates {
    fn render(&self, name: &str, params: &ParamMap) -> Result<String, SqlRowMapError> {
        let nodes = self.templates.get(name).ok_or_else(|| {
            tracing::debug!(name, "sql template miss");
            SqlRowMapError::ConfigError(format!("no SQL template registered as {name:?}"))
        })?;
        let mut out = String::new();
        render_nodes(nodes, params, &mut out);
        Ok(out)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    If {
        branches: Vec<(Expr, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Truthy(String),
    Compare(String, CmpOp, Literal),
}

#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone)]
enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
}

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%(-?)\s*(.*?)\s*(-?)%\}").unwrap_or_else(|e| panic!("directive regex: {e}"))
});

static EXPR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'[^']*'|"[^"]*"|==|!=|>=|<=|>|<|\(|\)|[^\s=!<>()]+"#)
        .unwrap_or_else(|e| panic!("expression regex: {e}"))
});

/// An open `if` block: finished branches plus the one being filled.
struct Frame {
    closed: Vec<(Expr, Vec<Node>)>,
    cond: Expr,
    body: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

impl Frame {
    fn open(cond: Expr) -> Self {
        Self {
            closed: Vec::new(),
            cond,
            body: Vec::new(),
            otherwise: None,
        }
    }

    fn body(&mut self) -> &mut Vec<Node> {
        match self.otherwise {
            Some(ref mut nodes) => nodes,
            None => &mut self.body,
        }
    }

    fn next_branch(&mut self, cond: Expr) {
        let prev = std::mem::replace(&mut self.cond, cond);
        let body = std::mem::take(&mut self.body);
        self.closed.push((prev, body));
    }

    fn finish(mut self) -> Node {
        self.closed.push((self.cond, self.body));
        Node::If {
            branches: self.closed,
            otherwise: self.otherwise.unwrap_or_default(),
        }
    }
}

fn parse(text: &str) -> Result<Vec<Node>, String> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut last = 0;
    // `-%}` on the previous directive strips whitespace after it.
    let mut trim_next = false;

    for caps in DIRECTIVE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let mut literal = &text[last..whole.start()];
        if trim_next {
            literal = literal.trim_start();
        }
        if caps.get(1).is_some_and(|m| !m.is_empty()) {
            literal = literal.trim_end();
        }
        if !literal.is_empty() {
            current(&mut root, &mut stack).push(Node::Text(literal.to_string()));
        }
        last = whole.end();
        trim_next = caps.get(3).is_some_and(|m| !m.is_empty());

        let directive = inner.as_str();
        let (keyword, rest) = directive
            .split_once(char::is_whitespace)
            .map_or((directive, ""), |(k, r)| (k, r.trim()));
        match keyword {
            "if" => stack.push(Frame::open(parse_expr(rest)?)),
            "elif" => {
                let frame = stack.last_mut().ok_or("elif without if")?;
                if frame.otherwise.is_some() {
                    return Err("elif after else".into());
                }
                frame.next_branch(parse_expr(rest)?);
            }
            "else" => {
                let frame = stack.last_mut().ok_or("else without if")?;
                if frame.otherwise.is_some() {
                    return Err("duplicate else".into());
                }
                frame.otherwise = Some(Vec::new());
            }
            "endif" => {
                let node = stack.pop().ok_or("endif without if")?.finish();
                current(&mut root, &mut stack).push(node);
            }
            other => return Err(format!("unsupported directive {other:?}")),
        }
    }

    if !stack.is_empty() {
        return Err("unterminated if block".into());
    }
    let tail = if trim_next {
        text[last..].trim_start()
    } else {
        &text[last..]
    };
    if !tail.is_empty() {
        root.push(Node::Text(tail.to_string()));
    }
    Ok(root)
}

fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [Frame]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(frame) => frame.body(),
        None => root,
    }
}

fn parse_expr(text: &str) -> Result<Expr, String> {
    let tokens: Vec<&str> = EXPR_TOKEN.find_iter(text).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return Err("empty condition".into());
    }
    let mut pos = 0;
    let expr = parse_or(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(format!("unexpected {:?} in condition {text:?}", tokens[pos]));
    }
    Ok(expr)
}

fn parse_or(tokens: &[&str], pos: &mut usize) -> Result<Expr, String> {
    let mut terms = vec![parse_and(tokens, pos)?];
    while tokens.get(*pos) == Some(&"or") {
        *pos += 1;
        terms.push(parse_and(tokens, pos)?);
    }
    Ok(if terms.len() == 1 {
        terms.remove(0)
    } else {
        Expr::Or(terms)
    })
}

fn parse_and(tokens: &[&str], pos: &mut usize) -> Result<Expr, String> {
    let mut terms = vec![parse_term(tokens, pos)?];
    while tokens.get(*pos) == Some(&"and") {
        *pos += 1;
        terms.push(parse_term(tokens, pos)?);
    }
    Ok(if terms.len() == 1 {
        terms.remove(0)
    } else {
        Expr::And(terms)
    })
}

fn parse_term(tokens: &[&str], pos: &mut usize) -> Result<Expr, String> {
    let token = *tokens.get(*pos).ok_or("condition ends early")?;
    *pos += 1;
    match token {
        "not" => Ok(Expr::Not(Box::new(parse_term(tokens, pos)?))),
        "(" => {
            let inner = parse_or(tokens, pos)?;
            if tokens.get(*pos) != Some(&")") {
                return Err("missing closing parenthesis".into());
            }
            *pos += 1;
            Ok(inner)
        }
        key if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            let op = match tokens.get(*pos).copied() {
                Some("==") => CmpOp::Eq,
                Some("!=") => CmpOp::Ne,
                Some(">") => CmpOp::Gt,
                Some(">=") => CmpOp::Ge,
                Some("<") => CmpOp::Lt,
                Some("<=") => CmpOp::Le,
                _ => return Ok(Expr::Truthy(key.to_string())),
            };
            *pos += 1;
            let raw = *tokens.get(*pos).ok_or("comparison without right-hand side")?;
            *pos += 1;
            Ok(Expr::Compare(key.to_string(), op, parse_literal(raw)?))
        }
        other => Err(format!("unexpected {other:?} in condition")),
    }
}

fn parse_literal(raw: &str) -> Result<Literal, String> {
    if raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')))
    {
        return Ok(Literal::Text(raw[1..raw.len() - 1].to_string()));
    }
    match raw {
        "true" => Ok(Literal::Bool(true)),
        "false" => Ok(Literal::Bool(false)),
        _ => raw
            .parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| format!("invalid literal {raw:?}")),
    }
}

fn render_nodes(nodes: &[Node], params: &ParamMap, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::If {
                branches,
                otherwise,
            } => {
                let chosen = branches
                    .iter()
                    .find(|(cond, _)| eval(cond, params))
                    .map_or(otherwise, |(_, body)| body);
                render_nodes(chosen, params, out);
            }
        }
    }
}

fn eval(expr: &Expr, params: &ParamMap) -> bool {
    match expr {
        Expr::Or(terms) => terms.iter().any(|t| eval(t, params)),
        Expr::And(terms) => terms.iter().all(|t| eval(t, params)),
        Expr::Not(inner) => !eval(inner, params),
        Expr::Truthy(key) => params.get(key).is_some_and(truthy),
        Expr::Compare(key, op, literal) => params
            .get(key)
            .and_then(|value| compare(value, literal))
            .is_some_and(|ord| match op {
                CmpOp::Eq => ord == Ordering::Equal,
                CmpOp::Ne => ord != Ordering::Equal,
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Ge => ord != Ordering::Less,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
            }),
    }
}

fn truthy(value: &RowValues) -> bool {
    match value {
        RowValues::Null => false,
        RowValues::Int(i) => *i != 0,
        RowValues::Float(f) => *f != 0.0,
        RowValues::Text(s) => !s.is_empty(),
        RowValues::Bool(b) => *b,
        RowValues::Timestamp(_) => true,
    }
}

fn compare(value: &RowValues, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (RowValues::Int(_) | RowValues::Float(_), Literal::Number(n)) => {
            value.as_float()?.partial_cmp(n)
        }
        (RowValues::Text(s), Literal::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (RowValues::Bool(b), Literal::Bool(l)) => Some(b.cmp(l)),
        _ => None,
    }
}
