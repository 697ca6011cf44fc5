//! Path conversion and document discovery.
//!
//! This module handles conversions between:
//! - Source file paths (files under the pages directory)
//! - Logical names (the path relative to the pages directory, `/`-separated)
//! - Target names (the logical name with markdown extensions rewritten to `.html`)

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

/// File names at the pages root that are consumed as templates, never as documents.
pub const HEAD_FILE: &str = "_head.html";
pub const TAIL_FILE: &str = "_tail.html";
pub const LAYOUT_FILE: &str = "_layout.html";
pub const RESERVED_FILES: [&str; 3] = [HEAD_FILE, TAIL_FILE, LAYOUT_FILE];

/// Extensions treated as markdown (lowercase, without dot).
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Extension written for converted markdown.
pub const OUTPUT_EXTENSION: &str = "html";

/// Returns true if the path has a markdown extension.
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
}

/// Derive the output name for a logical name.
///
/// # Examples
/// ```ignore
/// target_name_for("index.md") => "index.html"
/// target_name_for("blog/post.markdown") => "blog/post.html"
/// target_name_for("about.html") => "about.html"
/// target_name_for("feed.xml") => "feed.xml"
/// ```
pub fn target_name_for(name: &str) -> String {
    if !is_markdown(Path::new(name)) {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.{OUTPUT_EXTENSION}"),
        None => name.to_string(),
    }
}

/// Returns true if `name` is a relative path that stays below the directory it
/// is joined to. `..` components are never allowed.
pub fn is_contained(name: &str) -> bool {
    let path = Path::new(name);
    path.components().any(|c| matches!(c, Component::Normal(_)))
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Convert a path under `root` to its logical name.
///
/// Path separators are normalised to `/`.
pub fn logical_name(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let name = relative.to_string_lossy().replace('\\', "/");
    if name.is_empty() { None } else { Some(name) }
}

#[derive(thiserror::Error, Debug)]
#[error("failed to walk {path}: {source}")]
pub struct DiscoveryError {
    path: PathBuf,
    source: walkdir::Error,
}

/// Collect every processable file under the pages directory.
///
/// Files are returned in depth-first, file-name order. The reserved template
/// files are skipped at the pages root only.
pub fn discover_documents(pages_dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(pages_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError {
            path: pages_dir.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let is_reserved = entry.depth() == 1
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| RESERVED_FILES.contains(&name));
        if is_reserved {
            continue;
        }

        files.push(entry.into_path());
    }

    Ok(files)
}
