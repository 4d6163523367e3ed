//! Runtime settings.
//!
//! Loaded from an optional TOML file and overridden by the environment:
//! ```toml
//! schema_validation = "enforce"
//! content_dir = "content"
//! extensions = ["md", "mdx"]
//! body_format = "html"
//!
//! [collections]
//! docs = "content/docs"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::Collection;
use crate::error::{CmsError, Result};
use crate::mode::{BodyFormat, ValidationMode};

/// Default settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "mdcms.toml";

/// Environment variable overriding [`Settings::schema_validation`].
pub const VALIDATION_ENV: &str = "CMS_SCHEMA_VALIDATION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub schema_validation: ValidationMode,
    /// Directory that relative collection paths are resolved against.
    pub content_dir: PathBuf,
    /// Markdown file extensions, without the leading dot.
    pub extensions: Vec<String>,
    pub body_format: BodyFormat,
    /// Named collections and their directories.
    pub collections: BTreeMap<String, PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_validation: ValidationMode::default(),
            content_dir: PathBuf::from("content"),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            body_format: BodyFormat::default(),
            collections: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from [`SETTINGS_FILE`] when it exists,
    /// then apply the environment override.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Io`] if an explicitly given file cannot be read
    /// and [`CmsError::Config`] if the file or environment is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(SETTINGS_FILE).is_file() => {
                Self::from_file(Path::new(SETTINGS_FILE))?
            }
            None => Self::default(),
        };
        settings.with_validation_override(std::env::var(VALIDATION_ENV).ok().as_deref())
    }

    /// # Errors
    ///
    /// Returns [`CmsError::Io`] or [`CmsError::Config`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CmsError::io(path, e))?;
        Self::from_toml_str(&text)
            .map_err(|e| CmsError::Config(format!("{}: {e}", path.display())))
    }

    /// # Errors
    ///
    /// Returns [`CmsError::Config`] if the text is not a valid settings file.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CmsError::Config(e.to_string()))
    }

    /// Replace the validation mode when `value` is set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Config`] for an unknown mode string.
    pub fn with_validation_override(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.schema_validation = value.parse()?;
        }
        Ok(self)
    }

    /// Resolve a collection argument: a configured name first, then a
    /// directory under `content_dir`, then the argument as a plain path.
    #[must_use]
    pub fn resolve_collection(&self, arg: &str) -> Collection {
        if let Some(path) = self.collections.get(arg) {
            return Collection::new(arg, path.clone());
        }
        let under_content = self.content_dir.join(arg);
        if Path::new(arg).is_relative() && under_content.is_dir() {
            return Collection::from_path(under_content);
        }
        Collection::from_path(arg)
    }
}
