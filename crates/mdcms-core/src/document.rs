//! Document and collection types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Frontmatter metadata. Keys keep the order they were written in.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A named directory tree of markdown documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub path: PathBuf,
}

impl Collection {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Collection named after the final component of its directory.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One parsed markdown file of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Route under which the document is served, derived from its location.
    pub url_path: String,
    pub metadata: Metadata,
    /// Rendered body (HTML unless the caller asked for raw markdown).
    pub body: String,
    /// Where the document was read from. Provenance only.
    pub source_path: PathBuf,
}

impl Document {
    /// Whether the document should appear in public listings.
    ///
    /// `published: false` or `draft: true` hide a document; anything else,
    /// including missing keys, counts as published.
    #[must_use]
    pub fn is_published(&self) -> bool {
        let published = self
            .metadata
            .get("published")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true);
        let draft = self
            .metadata
            .get("draft")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        published && !draft
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get("title")
            .or_else(|| self.metadata.get("name"))
            .and_then(serde_json::Value::as_str)
    }
}
