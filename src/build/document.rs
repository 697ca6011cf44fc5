use std::path::{Path, PathBuf};

use super::paths::{is_markdown, target_name_for};

/// Ordered string-keyed mapping used for metadata, page data and extras.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

const FRONT_MATTER_DELIMITER: &str = "---";

// =============================================================================
// Front matter
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid front matter: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("front matter opened with `---` but never closed")]
    Unterminated,
}

/// Result of splitting a document into front matter and body.
#[derive(Debug, PartialEq)]
pub struct SplitContent<'a> {
    /// Parsed front matter; `None` when absent or empty
    pub meta: Option<Mapping>,
    /// Everything after the closing delimiter
    pub body: &'a str,
}

/// Split YAML front matter from a document body.
///
/// Front matter is only recognised when the input starts with `---`:
///
/// ```markdown
/// ---
/// title: My Page
/// tags: [rust, web]
/// ---
/// # Content starts here
/// ```
///
/// The input is cut at the first two delimiters; the body is everything after
/// the second one, untouched. Input without a leading delimiter is returned
/// whole as the body.
pub fn split_front_matter(content: &str) -> Result<SplitContent<'_>, FrontMatterError> {
    let Some(after_opening) = content.strip_prefix(FRONT_MATTER_DELIMITER) else {
        return Ok(SplitContent {
            meta: None,
            body: content,
        });
    };

    let (block, body) = after_opening
        .split_once(FRONT_MATTER_DELIMITER)
        .ok_or(FrontMatterError::Unterminated)?;

    if block.trim().is_empty() {
        return Ok(SplitContent { meta: None, body });
    }

    let meta = match serde_yaml::from_str::<serde_json::Value>(block)? {
        serde_json::Value::Null => None,
        serde_json::Value::Object(map) => Some(map),
        _ => return Err(FrontMatterError::NotAMapping),
    };

    Ok(SplitContent { meta, body })
}

// =============================================================================
// Documents
// =============================================================================

/// A document flowing through the build pipeline.
///
/// Created when the orchestrator discovers a path, mutated in place by the
/// splitter, each extension stage and the template composer, then dropped
/// once its output is written.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the pages directory, `/`-separated (e.g. "blog/post.md")
    pub name: String,
    /// Where the source was read from
    pub source_path: PathBuf,
    /// Mirror of the source path under the output root (extension untouched)
    pub dest_path: PathBuf,
    /// Output name relative to the output root; stages may override it
    pub target_name: String,
    /// Front matter, if any
    pub meta: Option<Mapping>,
    /// Body text (front matter removed); stages may replace it
    pub content: String,
    /// Page data exposed to templates as `Data`
    pub data: Mapping,
    /// Auxiliary data exposed to templates as `Extras`
    pub extras: Mapping,
}

impl Document {
    /// Create a document for a discovered source file. Content is not loaded yet.
    pub fn discovered(name: String, source_path: PathBuf, output_dir: &Path) -> Self {
        let dest_path = output_dir.join(&name);
        let target_name = target_name_for(&name);
        Self {
            name,
            source_path,
            dest_path,
            target_name,
            meta: None,
            content: String::new(),
            data: Mapping::new(),
            extras: Mapping::new(),
        }
    }

    /// Load the raw source from disk and split off its front matter.
    pub fn load(&mut self) -> Result<(), DocumentError> {
        let raw = std::fs::read_to_string(&self.source_path).map_err(|source| {
            DocumentError::Read {
                path: self.source_path.clone(),
                source,
            }
        })?;
        self.parse(&raw)
            .map_err(|source| DocumentError::FrontMatter {
                path: self.source_path.clone(),
                source,
            })
    }

    /// Split raw source text into metadata and body.
    pub fn parse(&mut self, raw: &str) -> Result<(), FrontMatterError> {
        let split = split_front_matter(raw)?;
        self.meta = split.meta;
        self.content = split.body.to_string();
        Ok(())
    }

    /// Returns true if the source is a markdown file.
    pub fn is_markdown(&self) -> bool {
        is_markdown(Path::new(&self.name))
    }

    /// Returns true if the source takes part in head/tail wrapping when no
    /// layout template exists.
    pub fn wants_head_tail(&self) -> bool {
        self.is_markdown()
            || Path::new(&self.name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
    }

    /// Final output location.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.target_name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: FrontMatterError,
    },
}
