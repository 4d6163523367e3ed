//! Error types for mdcms.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level result type for mdcms operations.
pub type Result<T> = std::result::Result<T, CmsError>;

/// Top-level error type for mdcms.
///
/// Every variant that concerns a file carries the path, so a failed
/// collection parse always names what it tripped over.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("collection not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load schema {}: {reason}", path.display())]
    SchemaLoad { path: PathBuf, reason: String },

    #[error("schema validation error for file {}: {errors}", path.display())]
    Validation {
        path: PathBuf,
        errors: ValidationErrors,
    },

    #[error("malformed frontmatter in {}: {reason}", path.display())]
    Frontmatter { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),
}

impl CmsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures while splitting or decoding a frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    #[error("invalid YAML frontmatter: {0}")]
    Yaml(String),

    #[error("invalid TOML frontmatter: {0}")]
    Toml(String),
}

/// A single metadata field failing its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },

    #[error("invalid field type for '{field}': expected {expected}, got {actual}")]
    InvalidFieldType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("invalid enum value '{value}' for field '{field}': allowed values are {allowed:?}")]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("unexpected field '{field}'")]
    UnexpectedField { field: String },

    #[error("{0}")]
    Rejected(String),
}

/// All failures collected while constructing validated metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<SchemaError>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, err: SchemaError) {
        self.0.push(err);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }
}

impl From<SchemaError> for ValidationErrors {
    fn from(err: SchemaError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
