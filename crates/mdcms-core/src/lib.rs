//! # mdcms-core
//!
//! Core types for mdcms flat-file content collections.
//!
//! - [`Document`] and [`Collection`]: the parsed content model
//! - Frontmatter extraction ([`frontmatter`])
//! - Schemas ([`MetadataSchema`], [`FieldSchema`], [`TypedSchema`])
//! - [`ValidationMode`]: how schema mismatches are handled
//! - [`Settings`]: file and environment configuration
//! - Error hierarchy ([`CmsError`], [`SchemaError`], [`ValidationErrors`])

pub mod document;
pub mod error;
pub mod frontmatter;
pub mod mode;
pub mod schema;
pub mod settings;

pub use document::{Collection, Document, Metadata};
pub use error::{CmsError, FrontmatterError, Result, SchemaError, ValidationErrors};
pub use mode::{BodyFormat, ValidationMode};
pub use schema::{FieldSchema, MetadataSchema, SchemaDefinition, TypedSchema};
pub use settings::Settings;
