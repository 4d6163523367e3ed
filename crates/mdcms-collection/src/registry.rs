//! Validators compiled into the binary, keyed by collection name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mdcms_core::{MetadataSchema, TypedSchema};

/// Frontmatter of the `docs` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsFrontmatter {
    pub name: String,
    pub category: String,
    pub tags: String,
}

/// Maps collection names to statically known validators.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<dyn MetadataSchema>>,
}

impl SchemaRegistry {
    /// An empty registry: only schema files on disk are used.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The validators shipped with mdcms.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("docs", TypedSchema::<DocsFrontmatter>::new("docs"));
        registry
    }

    /// Register `schema` for the collection called `collection`, replacing
    /// any previous registration.
    pub fn register(
        &mut self,
        collection: impl Into<String>,
        schema: impl MetadataSchema + 'static,
    ) -> &mut Self {
        self.schemas.insert(collection.into(), Arc::new(schema));
        self
    }

    #[must_use]
    pub fn get(&self, collection: &str) -> Option<Arc<dyn MetadataSchema>> {
        self.schemas.get(collection).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}
