//! The collection parser: directory tree in, documents out.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use mdcms_core::frontmatter::parse_frontmatter;
use mdcms_core::{
    BodyFormat, CmsError, Collection, Document, MetadataSchema, Result, Settings, ValidationMode,
};

use crate::loader::load_schema;
use crate::registry::SchemaRegistry;
use crate::render::render_markdown;
use crate::sink::{DiagnosticSink, TracingSink};
use crate::url::url_path;

/// Files whose name starts with this prefix configure the collection and
/// are never parsed as documents.
pub const SCHEMA_PREFIX: &str = "schema";

/// Per-call parser options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: ValidationMode,
    /// Accepted file extensions, compared case-insensitively, without dot.
    pub extensions: Vec<String>,
    pub body_format: BodyFormat,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: ValidationMode::default(),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            body_format: BodyFormat::default(),
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mode: settings.schema_validation,
            extensions: settings.extensions.clone(),
            body_format: settings.body_format,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_body_format(mut self, body_format: BodyFormat) -> Self {
        self.body_format = body_format;
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Parses collections with an injected schema registry and diagnostic sink.
pub struct CollectionParser<'a> {
    registry: &'a SchemaRegistry,
    sink: &'a dyn DiagnosticSink,
    options: ParseOptions,
}

impl<'a> CollectionParser<'a> {
    pub fn new(
        registry: &'a SchemaRegistry,
        sink: &'a dyn DiagnosticSink,
        options: ParseOptions,
    ) -> Self {
        Self {
            registry,
            sink,
            options,
        }
    }

    /// Parse every markdown document under the collection directory.
    ///
    /// Documents come back in depth-first traversal order with entries
    /// sorted by file name, so an unchanged tree always yields the same list.
    ///
    /// # Errors
    ///
    /// - [`CmsError::NotFound`] if the collection directory does not exist
    /// - [`CmsError::SchemaLoad`] if a schema file is malformed
    /// - [`CmsError::Io`] if the walk or a file read fails
    /// - [`CmsError::Frontmatter`] if a frontmatter block is not valid YAML
    ///   or TOML
    /// - [`CmsError::Validation`] on the first schema failure under
    ///   [`ValidationMode::Enforce`]
    ///
    /// No documents are returned when any of these occur.
    pub fn parse(&self, collection: &Collection) -> Result<Vec<Document>> {
        let root = collection.path();
        if !root.is_dir() {
            return Err(CmsError::NotFound(root.to_path_buf()));
        }

        let schema = load_schema(collection, self.registry)?;
        let validator = match self.options.mode {
            ValidationMode::Off => None,
            ValidationMode::Warn | ValidationMode::Enforce => {
                schema.as_ref().and_then(|s| s.validator())
            }
        };

        let mut documents = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                CmsError::io(path, e.into())
            })?;
            let path = entry.path();
            if entry.file_type().is_dir() || !path.is_file() {
                continue;
            }
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(SCHEMA_PREFIX)
            {
                debug!(path = %path.display(), "skipping schema file");
                continue;
            }
            if !self.options.accepts(path) {
                continue;
            }
            documents.push(self.parse_file(root, path, validator)?);
        }

        debug!(
            collection = %collection.name,
            documents = documents.len(),
            mode = %self.options.mode,
            "parsed collection"
        );
        Ok(documents)
    }

    fn parse_file(
        &self,
        root: &Path,
        path: &Path,
        validator: Option<&dyn MetadataSchema>,
    ) -> Result<Document> {
        let content = fs::read_to_string(path).map_err(|e| CmsError::io(path, e))?;
        let (raw, body) = parse_frontmatter(&content).map_err(|e| CmsError::Frontmatter {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let metadata = match validator.map(|schema| schema.construct(&raw)) {
            None => raw,
            Some(Ok(validated)) => validated,
            Some(Err(errors)) => match self.options.mode {
                ValidationMode::Enforce => {
                    return Err(CmsError::Validation {
                        path: path.to_path_buf(),
                        errors,
                    })
                }
                ValidationMode::Warn | ValidationMode::Off => {
                    self.sink.validation_failed(path, &errors);
                    raw
                }
            },
        };

        let body = match self.options.body_format {
            BodyFormat::Html => render_markdown(body),
            BodyFormat::Markdown => body.to_string(),
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        Ok(Document {
            url_path: url_path(relative),
            metadata,
            body,
            source_path: path.to_path_buf(),
        })
    }
}

/// Parse the collection at `collection_path` with the built-in schema
/// registry, reporting warnings through `tracing`.
///
/// The collection is named after the directory.
///
/// # Errors
///
/// See [`CollectionParser::parse`].
pub fn parse_collection(
    collection_path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Vec<Document>> {
    let registry = SchemaRegistry::builtin();
    let collection = Collection::from_path(collection_path.as_ref());
    CollectionParser::new(&registry, &TracingSink, options.clone()).parse(&collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use mdcms_core::{Metadata, SchemaError, ValidationErrors};
    use serde_json::json;
    use tempfile::TempDir;

    use crate::sink::MemorySink;

    /// Collection fixture under `<tmp>/<name>`.
    struct Fixture {
        _dir: TempDir,
        collection: Collection,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join(name);
            fs::create_dir_all(&root).unwrap();
            Self {
                _dir: dir,
                collection: Collection::from_path(root),
            }
        }

        fn write(&self, rel: &str, content: &str) -> &Self {
            let path = self.collection.path.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn root(&self) -> &Path {
            &self.collection.path
        }
    }

    fn parse_with(
        fixture: &Fixture,
        registry: &SchemaRegistry,
        sink: &dyn DiagnosticSink,
        mode: ValidationMode,
    ) -> Result<Vec<Document>> {
        CollectionParser::new(registry, sink, ParseOptions::default().with_mode(mode))
            .parse(&fixture.collection)
    }

    fn urls(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.url_path.as_str()).collect()
    }

    const POST_SCHEMA: &str = "name: post\nfields:\n  title: { type: string, required: true }\n";

    /// Counts construct calls and rejects metadata without `ok: true`.
    #[derive(Debug, Default)]
    struct CountingSchema {
        calls: Arc<AtomicUsize>,
    }

    impl MetadataSchema for CountingSchema {
        fn name(&self) -> &str {
            "counting"
        }

        fn construct(&self, metadata: &Metadata) -> std::result::Result<Metadata, ValidationErrors> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if metadata.get("ok") == Some(&json!(true)) {
                Ok(metadata.clone())
            } else {
                Err(SchemaError::Rejected("not ok".to_string()).into())
            }
        }
    }

    #[test]
    fn parses_every_markdown_file_without_schema() {
        let f = Fixture::new("blog");
        f.write("index.md", "---\ntitle: Home\n---\n# Welcome\n")
            .write("first.md", "First post")
            .write("2024/second.mdx", "---\ntitle: Second\n---\nBody")
            .write("2024/deep/index.md", "Deep");

        let docs = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Warn)
            .unwrap();
        assert_eq!(docs.len(), 4);
        assert_eq!(urls(&docs), ["2024/deep", "2024/second/", "first/", ""]);

        let home = docs.iter().find(|d| d.url_path.is_empty()).unwrap();
        assert_eq!(home.metadata["title"], "Home");
        assert_eq!(home.body, "<h1>Welcome</h1>\n");
        assert_eq!(home.source_path, f.root().join("index.md"));
    }

    #[test]
    fn skips_schema_files_and_non_markdown() {
        let f = Fixture::new("blog");
        f.write("schema.json", "{}")
            .write("schema.py", "SCHEMA = None")
            .write("schema.md", "not content")
            .write("sub/schema-notes.md", "still skipped")
            .write("notes.txt", "plain")
            .write("image.png", "")
            .write("README", "no extension")
            .write("page.MD", "upper-case extension")
            .write("post.md", "kept");

        let docs = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Warn)
            .unwrap();
        assert_eq!(urls(&docs), ["page/", "post/"]);
    }

    #[test]
    fn url_paths_follow_index_rules() {
        let f = Fixture::new("site");
        f.write("index.md", "")
            .write("a/index.md", "")
            .write("a/b.md", "");

        let docs = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Off)
            .unwrap();
        let mut got = urls(&docs);
        got.sort_unstable();
        assert_eq!(got, ["", "a", "a/b/"]);
    }

    #[test]
    fn extensions_are_configurable() {
        let f = Fixture::new("site");
        f.write("a.md", "").write("b.mdx", "");

        let registry = SchemaRegistry::new();
        let options = ParseOptions {
            extensions: vec![".md".to_string()],
            ..ParseOptions::default()
        };
        let docs = CollectionParser::new(&registry, &TracingSink, options)
            .parse(&f.collection)
            .unwrap();
        assert_eq!(urls(&docs), ["a/"]);
    }

    #[test]
    fn markdown_body_format_keeps_source() {
        let f = Fixture::new("site");
        f.write("a.md", "---\ntitle: A\n---\n\n# Heading\n");

        let registry = SchemaRegistry::new();
        let options = ParseOptions::default().with_body_format(BodyFormat::Markdown);
        let docs = CollectionParser::new(&registry, &TracingSink, options)
            .parse(&f.collection)
            .unwrap();
        assert_eq!(docs[0].body, "# Heading\n");
    }

    #[test]
    fn enforce_aborts_on_first_invalid_document() {
        let f = Fixture::new("blog");
        f.write("schema.yaml", POST_SCHEMA)
            .write("a-good.md", "---\ntitle: Fine\n---\n")
            .write("b-bad.md", "---\nauthor: Someone\n---\n");

        let err = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Enforce)
            .unwrap_err();
        match err {
            CmsError::Validation { path, errors } => {
                assert_eq!(path, f.root().join("b-bad.md"));
                assert_eq!(
                    errors.0,
                    [SchemaError::MissingRequiredField {
                        field: "title".to_string()
                    }]
                );
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn warn_keeps_original_metadata_and_records_warning() {
        let f = Fixture::new("blog");
        f.write("schema.yaml", POST_SCHEMA)
            .write("a-good.md", "---\ntitle: Fine\nlayout: wide\n---\n")
            .write("b-bad.md", "---\nauthor: Someone\n---\n");

        let sink = MemorySink::new();
        let docs = parse_with(&f, &SchemaRegistry::new(), &sink, ValidationMode::Warn).unwrap();
        assert_eq!(docs.len(), 2);

        // Valid documents get the normalized metadata, undeclared keys dropped.
        assert_eq!(
            serde_json::Value::Object(docs[0].metadata.clone()),
            json!({"title": "Fine"})
        );
        // Invalid ones keep what was written.
        assert_eq!(
            serde_json::Value::Object(docs[1].metadata.clone()),
            json!({"author": "Someone"})
        );

        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, f.root().join("b-bad.md"));
        assert!(warnings[0].errors.to_string().contains("title"));
    }

    #[test]
    fn off_never_attempts_validation() {
        let f = Fixture::new("posts");
        f.write("schema.py", "").write("a.md", "---\nok: false\n---\n");

        let schema = CountingSchema::default();
        let calls = Arc::clone(&schema.calls);
        let mut registry = SchemaRegistry::new();
        registry.register("posts", schema);

        let sink = MemorySink::new();
        let docs = parse_with(&f, &registry, &sink, ValidationMode::Off).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.is_empty());

        parse_with(&f, &registry, &sink, ValidationMode::Warn).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn raw_json_schema_never_validates() {
        let f = Fixture::new("blog");
        f.write("schema.json", r#"{"required": ["title"]}"#)
            .write("a.md", "---\nauthor: Someone\n---\n");

        let docs = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Enforce)
            .unwrap();
        assert_eq!(docs[0].metadata["author"], "Someone");
    }

    #[test]
    fn registered_validator_applies_by_collection_name() {
        let f = Fixture::new("docs");
        f.write("schema.py", "class DocsSchema: ...\n").write(
            "intro.md",
            "---\nname: Intro\ncategory: guides\ntags: start\ndraft: true\n---\n",
        );

        let docs = parse_with(&f, &SchemaRegistry::builtin(), &TracingSink, ValidationMode::Enforce)
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(docs[0].metadata.clone()),
            json!({"name": "Intro", "category": "guides", "tags": "start"})
        );
    }

    #[test]
    fn missing_collection_is_not_found() {
        let registry = SchemaRegistry::new();
        let parser = CollectionParser::new(&registry, &TracingSink, ParseOptions::default());
        let missing = Collection::from_path(PathBuf::from("/definitely/not/here"));
        assert!(matches!(
            parser.parse(&missing),
            Err(CmsError::NotFound(p)) if p == Path::new("/definitely/not/here")
        ));
    }

    #[test]
    fn malformed_schema_aborts_even_when_off() {
        let f = Fixture::new("blog");
        f.write("schema.toml", "name = ").write("a.md", "");
        let err = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Off)
            .unwrap_err();
        assert!(matches!(err, CmsError::SchemaLoad { .. }));
    }

    #[test]
    fn malformed_frontmatter_names_the_file() {
        let f = Fixture::new("blog");
        f.write("broken.md", "---\ntitle: [never closed\n---\n");
        let err = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Warn)
            .unwrap_err();
        match err {
            CmsError::Frontmatter { path, .. } => assert_eq!(path, f.root().join("broken.md")),
            other => panic!("expected frontmatter error, got {other}"),
        }
    }

    #[test]
    fn leading_horizontal_rule_is_not_frontmatter() {
        let f = Fixture::new("blog");
        f.write("good.md", "---\ntitle: Good\n---\nText\n")
            .write("rule.md", "---\n\nA post that opens with a horizontal rule.\n")
            .write("list.md", "---\n- a\n- b\n---\nBody\n");

        let docs = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Warn)
            .unwrap();
        assert_eq!(urls(&docs), ["good/", "list/", "rule/"]);
        assert!(docs[1].metadata.is_empty());
        assert_eq!(docs[1].body, "<p>Body</p>\n");
        assert!(docs[2].metadata.is_empty());
        assert!(docs[2].body.starts_with("<hr />"));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let f = Fixture::new("blog");
        fs::write(f.root().join("binary.md"), [0xff, 0xfe, 0x00]).unwrap();
        let err = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Warn)
            .unwrap_err();
        assert!(matches!(err, CmsError::Io { ref path, .. } if path.ends_with("binary.md")));
    }

    #[test]
    fn parsing_is_idempotent_and_read_only() {
        let f = Fixture::new("blog");
        f.write("schema.yaml", POST_SCHEMA)
            .write("a.md", "---\ntitle: A\n---\nText")
            .write("nested/b.md", "---\ntitle: B\n---\n")
            .write("nested/index.md", "---\ntitle: Index\n---\n");
        let before = fs::read_to_string(f.root().join("a.md")).unwrap();

        let first = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Enforce)
            .unwrap();
        let second = parse_with(&f, &SchemaRegistry::new(), &TracingSink, ValidationMode::Enforce)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(f.root().join("a.md")).unwrap(), before);
    }

    #[test]
    fn registered_name_alone_does_not_validate() {
        let f = Fixture::new("docs");
        f.write("a.md", "---\ntitle: A\ndraft: true\n---\n")
            .write("b.md", "---\nname: Only a name\n---\n");

        let docs = parse_collection(
            f.root(),
            &ParseOptions::default().with_mode(ValidationMode::Enforce),
        )
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(
            serde_json::Value::Object(docs[0].metadata.clone()),
            json!({"title": "A", "draft": true})
        );
        assert!(!docs[0].is_published());
    }

    #[test]
    fn parse_collection_uses_directory_name_with_schema_module() {
        let f = Fixture::new("docs");
        f.write("schema.py", "class DocsSchema: ...\n")
            .write("bad.md", "---\nname: Only a name\n---\n");

        let err = parse_collection(
            f.root(),
            &ParseOptions::default().with_mode(ValidationMode::Enforce),
        )
        .unwrap_err();
        assert!(matches!(err, CmsError::Validation { .. }));

        let docs = parse_collection(f.root(), &ParseOptions::default()).unwrap();
        assert_eq!(docs[0].metadata["name"], "Only a name");
    }

    #[test]
    fn options_follow_settings() {
        let settings = Settings {
            schema_validation: ValidationMode::Enforce,
            extensions: vec!["md".to_string()],
            body_format: BodyFormat::Markdown,
            ..Settings::default()
        };
        let options = ParseOptions::from_settings(&settings);
        assert_eq!(options.mode, ValidationMode::Enforce);
        assert_eq!(options.extensions, ["md"]);
        assert_eq!(options.body_format, BodyFormat::Markdown);
    }
}
