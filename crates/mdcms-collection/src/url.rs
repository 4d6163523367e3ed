//! URL paths derived from a document's place in the collection tree.
//!
//! - `index.md` → `""`
//! - `guides/index.md` → `"guides"`
//! - `intro.md` → `"intro/"`
//! - `guides/setup.md` → `"guides/setup/"`

use std::path::{Component, Path};

/// File stem that maps a document onto its directory's URL.
pub const INDEX_STEM: &str = "index";

/// Compute the URL path for a file, given its path relative to the
/// collection root. Segments are joined with `/` on every platform.
#[must_use]
pub fn url_path(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let Some((file, dirs)) = segments.split_last() else {
        return String::new();
    };

    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = dirs.join("/");

    if stem == INDEX_STEM {
        parent
    } else if parent.is_empty() {
        format!("{stem}/")
    } else {
        format!("{parent}/{stem}/")
    }
}
