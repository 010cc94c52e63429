use crate::error::SqlRowMapError;
use crate::types::{ISO_TIMESTAMP, RowValues};

use super::{Record, Shape};

/// Wrapper element around set results.
pub(super) const SET_ELEMENT: &str = "rows";

struct XmlWriter<'f> {
    out: String,
    // (prefix, indent) when pretty-printing
    layout: Option<(&'f str, &'f str)>,
}

impl XmlWriter<'_> {
    fn start_line(&mut self, depth: usize) {
        if let Some((prefix, indent)) = self.layout {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            self.out.push_str(prefix);
            for _ in 0..depth {
                self.out.push_str(indent);
            }
        }
    }

    fn open(&mut self, name: &str, depth: usize) {
        self.start_line(depth);
        self.out.push('<');
        self.out.push_str(name);
        self.out.push('>');
    }

    fn close(&mut self, name: &str, depth: usize) {
        self.start_line(depth);
        self.close_inline(name);
    }

    fn close_inline(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn leaf(&mut self, name: &str, value: &RowValues, depth: usize) -> Result<(), SqlRowMapError> {
        check_name(name)?;
        self.open(name, depth);
        match value {
            RowValues::Null => {}
            RowValues::Int(i) => self.out.push_str(&i.to_string()),
            RowValues::Float(f) if f.is_finite() => self.out.push_str(&f.to_string()),
            RowValues::Float(f) => {
                return Err(SqlRowMapError::EncodingError(format!(
                    "non-finite float {f} in {name} is not encodable"
                )));
            }
            RowValues::Text(s) => escape_into(&mut self.out, s),
            RowValues::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            RowValues::Timestamp(ts) => self.out.push_str(&ts.format(ISO_TIMESTAMP).to_string()),
        }
        self.close_inline(name);
        Ok(())
    }

    fn record(
        &mut self,
        element: &str,
        record: &Record<'_>,
        depth: usize,
    ) -> Result<(), SqlRowMapError> {
        self.open(element, depth);
        for (name, value) in record {
            self.leaf(name, value, depth + 1)?;
        }
        if record.is_empty() {
            self.close_inline(element);
        } else {
            self.close(element, depth);
        }
        Ok(())
    }
}

pub(super) fn write(
    records: &[Record<'_>],
    shape: Shape,
    element: &str,
    layout: Option<(&str, &str)>,
) -> Result<String, SqlRowMapError> {
    check_name(element)?;
    let mut writer = XmlWriter {
        out: String::new(),
        layout,
    };
    match shape {
        Shape::Single => {
            let empty = Record::new();
            writer.record(element, records.first().unwrap_or(&empty), 0)?;
        }
        Shape::Set => {
            writer.open(SET_ELEMENT, 0);
            for record in records {
                writer.record(element, record, 1)?;
            }
            if records.is_empty() {
                writer.close_inline(SET_ELEMENT);
            } else {
                writer.close(SET_ELEMENT, 0);
            }
        }
    }
    Ok(writer.out)
}

fn check_name(name: &str) -> Result<(), SqlRowMapError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SqlRowMapError::EncodingError(format!(
            "{name:?} is not a valid XML element name"
        )))
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record<'static> {
        vec![
            ("id", RowValues::Int(2)),
            ("title", RowValues::Text("a < b & \"c\"".into())),
            ("remark", RowValues::Null),
        ]
    }

    #[test]
    fn compact_single() {
        let xml = write(&[record()], Shape::Single, "Article", None).unwrap();
        assert_eq!(
            xml,
            "<Article><id>2</id><title>a &lt; b &amp; &#34;c&#34;</title><remark></remark></Article>"
        );
    }

    #[test]
    fn indented_set() {
        let xml = write(&[record(), record()], Shape::Set, "article", Some(("", "  "))).unwrap();
        let expected = "<rows>\n  <article>\n    <id>2</id>\n    \
            <title>a &lt; b &amp; &#34;c&#34;</title>\n    <remark></remark>\n  </article>\n  \
            <article>\n    <id>2</id>\n    <title>a &lt; b &amp; &#34;c&#34;</title>\n    \
            <remark></remark>\n  </article>\n</rows>";
        assert_eq!(xml, expected);
    }

    #[test]
    fn prefix_starts_every_line() {
        let xml = write(&[vec![("id", RowValues::Int(1))]], Shape::Single, "a", Some(("> ", "\t")))
            .unwrap();
        assert_eq!(xml, "> <a>\n> \t<id>1</id>\n> </a>");
    }

    #[test]
    fn empty_set_and_invalid_names() {
        assert_eq!(write(&[], Shape::Set, "row", None).unwrap(), "<rows></rows>");
        let bad = vec![("count(*)", RowValues::Int(1))];
        assert!(matches!(
            write(&[bad], Shape::Set, "row", None),
            Err(SqlRowMapError::EncodingError(_))
        ));
        assert!(write(&[], Shape::Set, "1row", None).is_err());
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let rec = vec![("ratio", RowValues::Float(f64::INFINITY))];
        assert!(write(&[rec], Shape::Single, "row", None).is_err());
    }
}
