//! Frontmatter extraction.
//!
//! A document may open with a metadata block, either YAML between `---`
//! lines or TOML between `+++` lines:
//! ```markdown
//! ---
//! title: "Getting started"
//! category: guides
//! ---
//!
//! ## Body content here
//! ```
//! Files without a complete block, either no opening delimiter or one that
//! is never closed, have no metadata and keep their whole text as body.

use serde_json::Value;

use crate::document::Metadata;
use crate::error::FrontmatterError;

/// Syntax of a frontmatter block, identified by its delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    Yaml,
    Toml,
}

impl FrontmatterFormat {
    #[must_use]
    pub fn delimiter(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    fn from_delimiter(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Split a markdown file into its raw frontmatter block and body.
///
/// Returns `None` when the file does not start with a delimiter line or
/// the delimiter is never closed; a lone `---` is a horizontal rule.
/// Otherwise returns `(format, raw_block, body)`, where the body has its
/// leading blank lines removed.
#[must_use]
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let (first, rest) = split_line(content);
    let format = FrontmatterFormat::from_delimiter(first)?;

    let mut remaining = rest;
    while !remaining.is_empty() {
        let (line, after) = split_line(remaining);
        if line.trim_end() == format.delimiter() {
            let raw = &rest[..rest.len() - remaining.len()];
            let body = after.trim_start_matches(['\r', '\n']);
            return Some((format, raw, body));
        }
        remaining = after;
    }

    None
}

/// Extract frontmatter metadata and the body that follows it.
///
/// An empty block, or one holding a scalar or list, yields empty metadata.
///
/// # Errors
///
/// Returns [`FrontmatterError`] if the block is not valid YAML or TOML.
pub fn parse_frontmatter(content: &str) -> Result<(Metadata, &str), FrontmatterError> {
    let Some((format, raw, body)) = split_frontmatter(content) else {
        return Ok((Metadata::new(), content));
    };

    if raw.trim().is_empty() {
        return Ok((Metadata::new(), body));
    }

    let value = match format {
        FrontmatterFormat::Yaml => serde_yaml::from_str::<Value>(raw)
            .map_err(|e| FrontmatterError::Yaml(e.to_string()))?,
        FrontmatterFormat::Toml => {
            let table: toml::Table =
                toml::from_str(raw).map_err(|e| FrontmatterError::Toml(e.to_string()))?;
            toml_to_json(toml::Value::Table(table))
        }
    };

    match value {
        Value::Object(map) => Ok((map, body)),
        _ => Ok((Metadata::new(), body)),
    }
}

fn split_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

/// Convert TOML to JSON, rendering datetimes as their TOML text.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Short type name of a JSON value, used in error messages.
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
