//! Frontmatter schemas.
//!
//! A schema turns raw frontmatter into validated metadata through
//! [`MetadataSchema::construct`]. Two kinds exist:
//! - [`FieldSchema`], built from a declarative [`SchemaDefinition`] file
//! - [`TypedSchema`], backed by a Rust type compiled into the binary

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Metadata;
use crate::error::{SchemaError, ValidationErrors};
use crate::frontmatter::value_kind;

/// Something that can validate frontmatter and return the normalized form.
pub trait MetadataSchema: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Build validated metadata from raw frontmatter.
    ///
    /// # Errors
    ///
    /// Returns every field failure found.
    fn construct(&self, metadata: &Metadata) -> Result<Metadata, ValidationErrors>;

    /// Machine-readable outline of the schema.
    fn describe(&self) -> Value {
        serde_json::json!({ "name": self.name() })
    }
}

/// Declarative schema file contents (`schema.toml` / `schema.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
    #[serde(default)]
    pub extra: ExtraFields,
}

/// Definition of a single field in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// For enum types: allowed values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Supported field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "string[]")]
    StringArray,
    Map,
    Json,
}

impl FieldType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Enum => "enum",
            Self::StringArray => "string[]",
            Self::Map => "map",
            Self::Json => "json",
        }
    }

    /// Whether `value` has this type. Enum membership is checked separately.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String | Self::Enum => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Date => value.as_str().is_some_and(is_date),
            Self::Datetime => value.as_str().is_some_and(is_datetime),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Map => value.is_object(),
            Self::Json => true,
        }
    }
}

fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_datetime(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
}

/// What happens to frontmatter keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraFields {
    /// Dropped from the validated metadata.
    #[default]
    Ignore,
    /// Passed through unchanged.
    Allow,
    /// Rejected as a validation failure.
    Forbid,
}

/// Validator built from a [`SchemaDefinition`].
#[derive(Debug, Clone)]
pub struct FieldSchema {
    definition: SchemaDefinition,
}

impl FieldSchema {
    /// Check a definition for internal consistency and wrap it.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency: an enum without
    /// values, or a default that does not match its field type.
    pub fn new(definition: SchemaDefinition) -> Result<Self, String> {
        for (name, def) in &definition.fields {
            if def.field_type == FieldType::Enum
                && def.values.as_ref().map_or(true, Vec::is_empty)
            {
                return Err(format!("enum field '{name}' declares no values"));
            }
            if let Some(default) = &def.default {
                if check_field(name, def, default).is_err() {
                    return Err(format!(
                        "default for field '{name}' is not a valid {}",
                        def.field_type.as_str()
                    ));
                }
            }
        }
        Ok(Self { definition })
    }

    #[must_use]
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }
}

fn check_field(name: &str, def: &FieldDef, value: &Value) -> Result<(), SchemaError> {
    if !def.field_type.accepts(value) {
        return Err(SchemaError::InvalidFieldType {
            field: name.to_string(),
            expected: def.field_type.as_str().to_string(),
            actual: value_kind(value).to_string(),
        });
    }
    if def.field_type == FieldType::Enum {
        let allowed = def.values.clone().unwrap_or_default();
        let value = value.as_str().unwrap_or_default();
        if !allowed.iter().any(|v| v == value) {
            return Err(SchemaError::InvalidEnumValue {
                field: name.to_string(),
                value: value.to_string(),
                allowed,
            });
        }
    }
    Ok(())
}

impl MetadataSchema for FieldSchema {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn construct(&self, metadata: &Metadata) -> Result<Metadata, ValidationErrors> {
        let fields = &self.definition.fields;
        let mut validated = Metadata::new();
        let mut errors = ValidationErrors::default();

        for (key, value) in metadata {
            match fields.get(key) {
                // Explicit nulls count as absent and are handled below.
                Some(_) if value.is_null() => {}
                Some(def) => match check_field(key, def, value) {
                    Ok(()) => {
                        validated.insert(key.clone(), value.clone());
                    }
                    Err(e) => errors.push(e),
                },
                None => match self.definition.extra {
                    ExtraFields::Ignore => {}
                    ExtraFields::Allow => {
                        validated.insert(key.clone(), value.clone());
                    }
                    ExtraFields::Forbid => errors.push(SchemaError::UnexpectedField {
                        field: key.clone(),
                    }),
                },
            }
        }

        for (name, def) in fields {
            if metadata.get(name).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(default) = &def.default {
                validated.insert(name.clone(), default.clone());
            } else if def.required {
                errors.push(SchemaError::MissingRequiredField {
                    field: name.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(errors)
        }
    }

    fn describe(&self) -> Value {
        serde_json::to_value(&self.definition).unwrap_or(Value::Null)
    }
}

/// Validator backed by a Rust type: frontmatter is deserialized into `T`
/// and the validated metadata is `T` serialized back.
pub struct TypedSchema<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> MetadataSchema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn name(&self) -> &str {
        self.name
    }

    fn construct(&self, metadata: &Metadata) -> Result<Metadata, ValidationErrors> {
        let typed: T = serde_json::from_value(Value::Object(metadata.clone()))
            .map_err(|e| SchemaError::Rejected(e.to_string()))?;
        match serde_json::to_value(&typed).map_err(|e| SchemaError::Rejected(e.to_string()))? {
            Value::Object(map) => Ok(map),
            other => Err(SchemaError::Rejected(format!(
                "schema '{}' produced {} instead of a mapping",
                self.name,
                value_kind(&other)
            ))
            .into()),
        }
    }

    fn describe(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "type": std::any::type_name::<T>(),
        })
    }
}
