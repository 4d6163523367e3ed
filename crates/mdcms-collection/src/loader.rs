//! Schema discovery for a collection.
//!
//! At most one schema applies to a collection, and only when a schema file
//! sits in its root. Sources, first hit wins:
//! 1. `schema.py`, standing for the validator registered under the
//!    collection name in [`SchemaRegistry`]; the file itself is never run
//! 2. a declarative definition: `schema.toml`, `schema.yaml`, `schema.yml`
//! 3. plain data in `schema.json`, returned verbatim without validation

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use mdcms_core::{CmsError, Collection, FieldSchema, MetadataSchema, Result, SchemaDefinition};

use crate::registry::SchemaRegistry;

/// Marker for a compiled-in validator.
pub const MODULE_FILE: &str = "schema.py";

/// Declarative schema files, in lookup order.
pub const DEFINITION_FILES: [&str; 3] = ["schema.toml", "schema.yaml", "schema.yml"];

/// Plain structured-data schema file.
pub const DATA_FILE: &str = "schema.json";

/// A schema discovered for a collection.
#[derive(Debug, Clone)]
pub enum LoadedSchema {
    /// Can construct validated metadata.
    Validator(Arc<dyn MetadataSchema>),
    /// Parsed file contents with no validation semantics attached.
    Raw { path: PathBuf, value: Value },
}

impl LoadedSchema {
    #[must_use]
    pub fn is_validator(&self) -> bool {
        matches!(self, Self::Validator(_))
    }

    #[must_use]
    pub fn validator(&self) -> Option<&dyn MetadataSchema> {
        match self {
            Self::Validator(schema) => Some(schema.as_ref()),
            Self::Raw { .. } => None,
        }
    }

    /// Machine-readable outline, used for display.
    #[must_use]
    pub fn describe(&self) -> Value {
        match self {
            Self::Validator(schema) => serde_json::json!({
                "kind": "validator",
                "schema": schema.describe(),
            }),
            Self::Raw { path, value } => serde_json::json!({
                "kind": "raw",
                "path": path.display().to_string(),
                "schema": value,
            }),
        }
    }
}

/// Find and load the schema for `collection`.
///
/// Absence is not an error and yields `None`. A registered validator is
/// only picked up when [`MODULE_FILE`] exists in the collection root.
///
/// # Errors
///
/// Returns [`CmsError::SchemaLoad`] if a schema file exists but cannot be
/// read or parsed.
pub fn load_schema(
    collection: &Collection,
    registry: &SchemaRegistry,
) -> Result<Option<LoadedSchema>> {
    let root = collection.path();

    let module = root.join(MODULE_FILE);
    if module.is_file() {
        match registry.get(&collection.name) {
            Some(schema) => {
                debug!(collection = %collection.name, schema = schema.name(), "using registered schema");
                return Ok(Some(LoadedSchema::Validator(schema)));
            }
            None => warn!(
                collection = %collection.name,
                path = %module.display(),
                "no validator registered for schema module, ignoring it"
            ),
        }
    }

    for file in DEFINITION_FILES {
        let path = root.join(file);
        if path.is_file() {
            let schema = load_definition(&path)?;
            debug!(collection = %collection.name, path = %path.display(), "loaded schema definition");
            return Ok(Some(LoadedSchema::Validator(Arc::new(schema))));
        }
    }

    let path = root.join(DATA_FILE);
    if path.is_file() {
        let text = read(&path)?;
        let value: Value = serde_json::from_str(&text).map_err(|e| load_error(&path, e))?;
        debug!(collection = %collection.name, path = %path.display(), "loaded raw schema data");
        return Ok(Some(LoadedSchema::Raw { path, value }));
    }

    Ok(None)
}

fn load_definition(path: &Path) -> Result<FieldSchema> {
    let text = read(path)?;
    let definition: SchemaDefinition = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text).map_err(|e| load_error(path, e))?,
        _ => serde_yaml::from_str(&text).map_err(|e| load_error(path, e))?,
    };
    FieldSchema::new(definition).map_err(|reason| CmsError::SchemaLoad {
        path: path.to_path_buf(),
        reason,
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| load_error(path, e))
}

fn load_error(path: &Path, err: impl std::fmt::Display) -> CmsError {
    CmsError::SchemaLoad {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
