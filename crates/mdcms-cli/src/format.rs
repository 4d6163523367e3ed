//! Listing output: JSON, Table, and Markdown.

use clap::ValueEnum;
use serde_json::Value;

use mdcms_core::Document;

/// Output format for document listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Markdown,
}

const COLUMNS: [&str; 3] = ["url_path", "title", "source_path"];

/// Format a document listing in the given output format.
#[must_use]
pub fn format_documents(docs: &[Document], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(docs),
        OutputFormat::Table => format_table(docs),
        OutputFormat::Markdown => format_markdown(docs),
    }
}

fn format_json(docs: &[Document]) -> String {
    serde_json::to_string_pretty(docs).unwrap_or_else(|_| "[]".to_string())
}

fn cells(doc: &Document) -> [String; 3] {
    [
        if doc.url_path.is_empty() {
            "/".to_string()
        } else {
            doc.url_path.clone()
        },
        doc.title().unwrap_or("").to_string(),
        doc.source_path.display().to_string(),
    ]
}

fn format_table(docs: &[Document]) -> String {
    if docs.is_empty() {
        return "(no documents)".to_string();
    }

    let rows: Vec<[String; 3]> = docs.iter().map(cells).collect();
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&sep.join("-+-"));
    output.push('\n');

    for row in &rows {
        let vals: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect();
        output.push_str(vals.join(" | ").trim_end());
        output.push('\n');
    }

    output
}

fn format_markdown(docs: &[Document]) -> String {
    if docs.is_empty() {
        return "*No documents*\n".to_string();
    }

    let mut output = String::new();
    output.push_str("| ");
    output.push_str(&COLUMNS.join(" | "));
    output.push_str(" |\n");
    output.push_str("| ");
    output.push_str(&["---"; 3].join(" | "));
    output.push_str(" |\n");

    for doc in docs {
        let vals: Vec<String> = cells(doc).iter().map(|c| c.replace('|', "\\|")).collect();
        output.push_str("| ");
        output.push_str(&vals.join(" | "));
        output.push_str(" |\n");
    }

    output
}

/// Pretty JSON for arbitrary values (schema descriptions).
#[must_use]
pub fn format_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
