//! Date layouts for rendering timestamp columns.
//!
//! Layouts are written by example against the reference time `2006-01-02 15:04:05`
//! (`"20060102"`, `"2006/01/02"`, `"01/02/2006"`, `"2006-01-02 15:04"`), with token
//! patterns such as `"YYYYMMDD"`, or directly as strftime strings (`"%Y%m%d"`).

use std::fmt::Write;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};

use crate::error::SqlRowMapError;

/// A validated date layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLayout {
    pattern: String,
    strftime: String,
}

// Longest tokens first so that `January` wins over `Jan`, `2006` over `06`, and `02`
// over `2`.
const TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("2006", "%Y"),
    ("YYYY", "%Y"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

// Zone tokens need an offset, which `NaiveDateTime` does not carry.
const ZONE_TOKENS: &[&str] = &[
    "Z07:00:00",
    "-07:00:00",
    "Z07:00",
    "-07:00",
    "Z0700",
    "-0700",
    "Z07",
    "-07",
    "MST",
];

impl DateLayout {
    /// Parse and validate a layout.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the layout is empty, is not a valid
    /// strftime pattern after translation, or needs a time zone offset.
    pub fn parse(pattern: &str) -> Result<Self, SqlRowMapError> {
        if pattern.is_empty() {
            return Err(SqlRowMapError::ConfigError("empty date layout".into()));
        }
        let strftime = if pattern.contains('%') {
            pattern.to_string()
        } else {
            translate(pattern)?
        };
        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(SqlRowMapError::ConfigError(format!(
                "invalid date layout {pattern:?}"
            )));
        }
        // Items such as `%z` parse but cannot render without an offset.
        let mut rendered = String::new();
        if write!(rendered, "{}", NaiveDateTime::default().format(&strftime)).is_err() {
            return Err(SqlRowMapError::ConfigError(format!(
                "date layout {pattern:?} needs a time zone, but values carry none"
            )));
        }
        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
        })
    }

    /// The layout as supplied by the caller.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render `value` with this layout.
    #[must_use]
    pub fn format(&self, value: &NaiveDateTime) -> String {
        let mut out = String::with_capacity(self.strftime.len() + 8);
        if write!(out, "{}", value.format(&self.strftime)).is_err() {
            // `parse` has already rendered this layout once.
            out.clear();
            out.push_str(&value.to_string());
        }
        out
    }
}

impl std::str::FromStr for DateLayout {
    type Err = SqlRowMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn translate(pattern: &str) -> Result<String, SqlRowMapError> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        if let Some(zone) = ZONE_TOKENS.iter().find(|zone| rest.starts_with(*zone)) {
            return Err(SqlRowMapError::ConfigError(format!(
                "date layout {pattern:?} uses zone token {zone:?}, but values carry no offset"
            )));
        }
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap()
    }

    #[test]
    fn reference_layouts() {
        let cases = [
            ("20060102", "20240305"),
            ("2006/01/02", "2024/03/05"),
            ("01/02/2006", "03/05/2024"),
            ("2006-01-02 15:04", "2024-03-05 14:07"),
            ("2006/01/02 15:04:05", "2024/03/05 14:07:09"),
            ("Jan 02, 2006", "Mar 05, 2024"),
            ("03:04 PM", "02:07 PM"),
        ];
        for (layout, expected) in cases {
            assert_eq!(DateLayout::parse(layout).unwrap().format(&sample()), expected, "{layout}");
        }
    }

    #[test]
    fn token_and_strftime_layouts() {
        assert_eq!(DateLayout::parse("YYYYMMDD").unwrap().format(&sample()), "20240305");
        assert_eq!(DateLayout::parse("DD.MM.YY HH:mm:ss").unwrap().format(&sample()), "05.03.24 14:07:09");
        assert_eq!(DateLayout::parse("%d/%m/%Y").unwrap().format(&sample()), "05/03/2024");
    }

    #[test]
    fn short_reference_tokens() {
        let cases = [
            ("1/2/2006", "3/5/2024"),
            ("_2 Jan 2006", " 5 Mar 2024"),
            ("3:4:5 pm", "2:7:9 pm"),
            ("2006.002", "2024.065"),
            ("January 2, 2006", "March 5, 2024"),
            ("2006-01-02T15:04:05", "2024-03-05T14:07:09"),
        ];
        for (layout, expected) in cases {
            assert_eq!(DateLayout::parse(layout).unwrap().format(&sample()), expected, "{layout}");
        }
    }

    #[test]
    fn rejects_invalid_layouts() {
        assert!(matches!(DateLayout::parse(""), Err(SqlRowMapError::ConfigError(_))));
        assert!(DateLayout::parse("%Q").is_err());
    }

    #[test]
    fn rejects_layouts_that_need_an_offset() {
        for layout in [
            "%Y%m%d %z",
            "%Y-%m-%dT%H:%M:%S%:z",
            "%d %Z",
            "2006-01-02T15:04:05Z07:00",
            "2006-01-02 15:04:05 -0700",
            "02 Jan 06 15:04 MST",
        ] {
            assert!(
                matches!(DateLayout::parse(layout), Err(SqlRowMapError::ConfigError(_))),
                "{layout}"
            );
        }
    }
}
