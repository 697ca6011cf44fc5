use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::log;

use super::document::{Document, DocumentError};
use super::highlight::{SyntaxHighlighter, UnknownTheme};
use super::markdown::{MarkdownOptions, MarkdownRenderer};
use super::paths::{DiscoveryError, discover_documents, logical_name};
use super::pipeline::{EntryPoint, PipelineError, StageList};
use super::render::{RenderError, Renderer, SiteContext, SiteLayout};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Highlight(#[from] UnknownTheme),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("failed to copy public files from {path}: {source}")]
    Public {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub documents: usize,
    pub static_files: usize,
    pub stages: usize,
}

pub struct Builder {
    config: BuildConfig,
    /// Stages supplied up front; discovered from the hooks directory otherwise
    stages: Option<StageList>,
}

impl Builder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            stages: None,
        }
    }

    /// Use the given stages instead of discovering them.
    #[cfg(test)]
    pub fn with_stages(mut self, stages: StageList) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn build(self) -> Result<BuildResult, BuildError> {
        // Build pipeline:
        // 1. Read the layout or head/tail snippets
        // 2. Copy public files
        // 3. Start stages and discover documents
        // 4. before_build hooks
        // 5. Load, transform, render and write each document in turn
        // 6. after_build hooks, then tear the stages down

        let pages_dir = self.config.pages_dir();
        let output_dir = self.config.out.clone();

        let layout = SiteLayout::discover(&pages_dir)?;
        let renderer = Renderer::new(
            SiteContext {
                base_url: self.config.base_url.clone(),
            },
            layout,
        );

        let static_files = copy_public(&self.config.public_dir(), &output_dir)?;

        let mut stages = match self.stages {
            Some(stages) => stages,
            None => StageList::discover(&self.config.hooks_dir(), &self.config.path)?,
        };

        let sources = discover_documents(&pages_dir)?;
        log::debug(&format!("found {} document(s)", sources.len()));

        let highlighter = if self.config.highlight {
            Some(SyntaxHighlighter::new(&self.config.highlight_theme)?)
        } else {
            None
        };
        let markdown = MarkdownRenderer::new(MarkdownOptions {
            hard_wrap: self.config.hard_wrap,
            highlighter,
        });

        stages.run_hook(EntryPoint::BeforeBuild)?;

        for source_path in &sources {
            let Some(name) = logical_name(source_path, &pages_dir) else {
                continue;
            };
            let mut doc = Document::discovered(name, source_path.clone(), &output_dir);
            log::debug(&format!("{} -> {}", doc.name, doc.target_name));

            doc.load()?;
            stages.transform(&mut doc, &markdown)?;
            let html = renderer.render_document(&doc, &markdown)?;
            write_output(&doc.output_path(&output_dir), &html)?;
        }

        stages.run_hook(EntryPoint::AfterBuild)?;
        let stage_count = stages.len();
        stages.close()?;

        Ok(BuildResult {
            output_dir,
            documents: sources.len(),
            static_files,
            stages: stage_count,
        })
    }
}

/// Write a page, creating parent directories and replacing any previous file.
fn write_output(path: &Path, contents: &str) -> Result<(), BuildError> {
    let write_err = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, contents).map_err(write_err)?;
    log::debug(&format!("wrote {}", path.display()));
    Ok(())
}

/// Copy everything under `public_dir` into the output root. Returns the number
/// of files copied; a missing public directory copies nothing.
fn copy_public(public_dir: &Path, output_dir: &Path) -> Result<usize, BuildError> {
    if !public_dir.is_dir() {
        log::debug(&format!("no public directory at {}", public_dir.display()));
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(public_dir).min_depth(1) {
        let entry = entry.map_err(|source| BuildError::Public {
            path: public_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(public_dir) else {
            continue;
        };

        let output_path = output_dir.join(relative);
        let write_err = |source| BuildError::Write {
            path: output_path.clone(),
            source,
        };
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::copy(entry.path(), &output_path).map_err(write_err)?;
        copied += 1;
    }

    Ok(copied)
}
