//! mdcms CLI: flat-file markdown content collections
//!
//! Commands: parse, check, schema

mod format;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mdcms_collection::{
    load_schema, CollectionParser, MemorySink, ParseOptions, SchemaRegistry, TracingSink,
};
use mdcms_core::{BodyFormat, CmsError, Collection, Settings, ValidationMode};

use crate::format::{format_documents, format_value, OutputFormat};

#[derive(Parser)]
#[command(name = "mdcms")]
#[command(version)]
#[command(about = "Flat-file markdown content collections")]
struct Cli {
    /// Settings file (defaults to ./mdcms.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Parse a collection and print its documents
    Parse {
        /// Collection name from the settings, or a directory
        collection: String,
        /// Override the schema validation mode: off, warn, or enforce
        #[arg(long)]
        mode: Option<ValidationMode>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Drop documents marked `published: false` or `draft: true`
        #[arg(long)]
        published_only: bool,
        /// Keep bodies as markdown instead of rendering HTML
        #[arg(long)]
        markdown_body: bool,
    },
    /// Validate every document against its collection's schema
    Check {
        #[arg(required = true)]
        collections: Vec<String>,
    },
    /// Show the schema discovered for a collection
    Schema { collection: String },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    let registry = SchemaRegistry::builtin();

    match cli.command {
        Commands::Parse {
            collection,
            mode,
            format,
            published_only,
            markdown_body,
        } => {
            let mut options = ParseOptions::from_settings(&settings);
            if let Some(mode) = mode {
                options = options.with_mode(mode);
            }
            if markdown_body {
                options = options.with_body_format(BodyFormat::Markdown);
            }

            let collection = settings.resolve_collection(&collection);
            let mut docs = CollectionParser::new(&registry, &TracingSink, options)
                .parse(&collection)
                .with_context(|| format!("failed to parse collection '{}'", collection.name))?;
            if published_only {
                docs.retain(|d| d.is_published());
            }
            println!("{}", format_documents(&docs, format));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { collections } => Ok(check(&settings, &registry, &collections)),
        Commands::Schema { collection } => {
            let collection = settings.resolve_collection(&collection);
            let described = match load_schema(&collection, &registry)? {
                Some(schema) => schema.describe(),
                None => serde_json::json!({ "kind": "none" }),
            };
            println!("{}", format_value(&described));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Validate collections, reporting every failing document and every
/// collection that could not be read.
fn check(
    settings: &Settings,
    registry: &SchemaRegistry,
    names: &[String],
) -> ExitCode {
    let options = ParseOptions::from_settings(settings)
        .with_mode(ValidationMode::Warn)
        .with_body_format(BodyFormat::Markdown);
    let mut failures = 0;

    for name in names {
        let collection = settings.resolve_collection(name);
        match check_collection(&collection, registry, &options) {
            Ok(invalid) => failures += invalid,
            Err(err) => {
                println!("Failed to check collection {}: {err}", collection.name);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return ExitCode::FAILURE;
    }
    println!("All files validated successfully.");
    ExitCode::SUCCESS
}

/// Check one collection, returning how many documents failed validation.
fn check_collection(
    collection: &Collection,
    registry: &SchemaRegistry,
    options: &ParseOptions,
) -> mdcms_core::Result<usize> {
    if !collection.path.is_dir() {
        return Err(CmsError::NotFound(collection.path.clone()));
    }
    let has_validator =
        load_schema(collection, registry)?.is_some_and(|schema| schema.is_validator());
    if !has_validator {
        println!(
            "No schema found in {}. Skipping validation.",
            collection.path.display()
        );
        return Ok(0);
    }

    let sink = MemorySink::new();
    let docs = CollectionParser::new(registry, &sink, options.clone()).parse(collection)?;

    let warnings = sink.warnings();
    for warning in &warnings {
        println!("Schema validation error in file {}:", warning.path.display());
        for err in warning.errors.iter() {
            println!("  {err}");
        }
    }
    println!(
        "{}: {} of {} documents valid",
        collection.name,
        docs.len() - warnings.len(),
        docs.len()
    );
    Ok(warnings.len())
}
