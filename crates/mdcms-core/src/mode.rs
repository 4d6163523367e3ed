//! Validation strictness and body output format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CmsError;

/// How schema mismatches are handled while parsing a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ValidationMode {
    /// Never validate, even when a schema is present.
    Off,
    /// Validate; on failure report a warning and keep the raw metadata.
    #[default]
    Warn,
    /// Validate; on failure abort the whole parse.
    Enforce,
}

impl ValidationMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Warn => "warn",
            Self::Enforce => "enforce",
        }
    }
}

impl FromStr for ValidationMode {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "enforce" => Ok(Self::Enforce),
            other => Err(CmsError::Config(format!(
                "unknown validation mode '{other}': expected off, warn, or enforce"
            ))),
        }
    }
}

impl TryFrom<String> for ValidationMode {
    type Error = CmsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form in which document bodies are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Html,
    /// The markdown source after the frontmatter block, untouched.
    Markdown,
}
