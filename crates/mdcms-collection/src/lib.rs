//! # mdcms-collection
//!
//! Reads a content collection: a directory tree of markdown files with
//! optional frontmatter and an optional schema in the collection root.
//!
//! Parsing never writes to the tree and keeps no state between calls;
//! every call walks the directory again.

pub mod loader;
pub mod parser;
pub mod registry;
pub mod render;
pub mod sink;
pub mod url;

pub use loader::{load_schema, LoadedSchema};
pub use parser::{parse_collection, CollectionParser, ParseOptions};
pub use registry::SchemaRegistry;
pub use sink::{DiagnosticSink, MemorySink, TracingSink, ValidationWarning};
